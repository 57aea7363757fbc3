//! GLB fixture builder for tests
//!
//! Assembles a binary glTF container from typed vertex data so decoder and
//! registry tests do not depend on model files on disk.

use serde_json::{json, Value};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const FLOAT: u32 = 5126;
const UNSIGNED_BYTE: u32 = 5121;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

/// Incrementally built glTF document plus its BIN chunk
#[derive(Default)]
pub(crate) struct GlbBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    materials: Vec<Value>,
    textures: Vec<Value>,
    images: Vec<Value>,
}

impl GlbBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a buffer view, 4-byte aligned, and return its index
    pub(crate) fn view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let mut view = json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        });
        if let Some(stride) = stride {
            view["byteStride"] = json!(stride);
        }
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(view);
        self.buffer_views.len() - 1
    }

    /// Append a view with an arbitrary range and no backing bytes
    pub(crate) fn view_at(&mut self, byte_offset: usize, byte_length: usize) -> usize {
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": byte_offset,
            "byteLength": byte_length,
        }));
        self.buffer_views.len() - 1
    }

    /// Append an accessor and return its index; `extra` is merged in
    pub(crate) fn accessor(
        &mut self,
        view: usize,
        byte_offset: usize,
        component_type: u32,
        count: usize,
        kind: &str,
        extra: Value,
    ) -> usize {
        let mut accessor = json!({
            "bufferView": view,
            "byteOffset": byte_offset,
            "componentType": component_type,
            "count": count,
            "type": kind,
        });
        if let (Some(target), Value::Object(fields)) = (accessor.as_object_mut(), extra) {
            target.extend(fields);
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    pub(crate) fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        let bytes = floats(positions.iter().flatten());
        let view = self.view(&bytes, None);
        self.accessor(view, 0, FLOAT, positions.len(), "VEC3", json!({ "min": min, "max": max }))
    }

    pub(crate) fn uvs(&mut self, uvs: &[[f32; 2]]) -> usize {
        let bytes = floats(uvs.iter().flatten());
        let view = self.view(&bytes, None);
        self.accessor(view, 0, FLOAT, uvs.len(), "VEC2", json!({}))
    }

    /// Normalized RGBA8 colors
    pub(crate) fn colors_u8(&mut self, colors: &[[u8; 4]]) -> usize {
        let bytes: Vec<u8> = colors.iter().flatten().copied().collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 0, UNSIGNED_BYTE, colors.len(), "VEC4", json!({ "normalized": true }))
    }

    pub(crate) fn indices_u8(&mut self, indices: &[u8]) -> usize {
        let view = self.view(indices, None);
        self.accessor(view, 0, UNSIGNED_BYTE, indices.len(), "SCALAR", json!({}))
    }

    pub(crate) fn indices_u16(&mut self, indices: &[u16]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 0, UNSIGNED_SHORT, indices.len(), "SCALAR", json!({}))
    }

    pub(crate) fn indices_u32(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.view(&bytes, None);
        self.accessor(view, 0, UNSIGNED_INT, indices.len(), "SCALAR", json!({}))
    }

    /// Material whose base color comes from an image stored in the BIN chunk
    pub(crate) fn embedded_texture_material(&mut self, image: &[u8]) -> usize {
        let view = self.view(image, None);
        self.images.push(json!({ "bufferView": view, "mimeType": "image/png" }));
        self.texture_material()
    }

    /// Material whose base color comes from an external image file
    pub(crate) fn uri_texture_material(&mut self, uri: &str) -> usize {
        self.images.push(json!({ "uri": uri }));
        self.texture_material()
    }

    fn texture_material(&mut self) -> usize {
        self.textures.push(json!({ "source": self.images.len() - 1 }));
        self.materials.push(json!({
            "pbrMetallicRoughness": {
                "baseColorTexture": { "index": self.textures.len() - 1 }
            }
        }));
        self.materials.len() - 1
    }

    pub(crate) fn mesh(&mut self, name: Option<&str>, primitives: Vec<Value>) -> usize {
        let mut mesh = json!({ "primitives": primitives });
        if let Some(name) = name {
            mesh["name"] = json!(name);
        }
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Serialize into GLB bytes
    pub(crate) fn build(mut self) -> Vec<u8> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }

        let mut document = json!({
            "asset": { "version": "2.0" },
            "buffers": [{ "byteLength": self.bin.len() }],
            "bufferViews": self.buffer_views,
            "accessors": self.accessors,
            "meshes": self.meshes,
        });
        if !self.materials.is_empty() {
            document["materials"] = json!(self.materials);
            document["textures"] = json!(self.textures);
            document["images"] = json!(self.images);
        }

        let mut json_chunk = serde_json::to_vec(&document).unwrap();
        while json_chunk.len() % 4 != 0 {
            json_chunk.push(b' ');
        }

        let total = 12 + 8 + json_chunk.len() + 8 + self.bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json_chunk);
        out.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&self.bin);
        out
    }
}

/// A primitive object with the given attributes; `mode` defaults to triangles
pub(crate) fn primitive(
    attributes: Value,
    indices: Option<usize>,
    material: Option<usize>,
    mode: Option<u32>,
) -> Value {
    let mut primitive = json!({ "attributes": attributes });
    if let Some(indices) = indices {
        primitive["indices"] = json!(indices);
    }
    if let Some(material) = material {
        primitive["material"] = json!(material);
    }
    if let Some(mode) = mode {
        primitive["mode"] = json!(mode);
    }
    primitive
}

/// Encode a solid-color PNG
pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(width, height, image::Rgba(color))
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn floats<'a>(values: impl Iterator<Item = &'a f32>) -> Vec<u8> {
    values.flat_map(|v| v.to_le_bytes()).collect()
}
