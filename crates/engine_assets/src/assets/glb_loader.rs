//! Binary glTF (GLB) model decoder
//!
//! Walks every mesh primitive of a GLB container and decodes its accessors
//! into [`Vertex`]/`u16` index streams, then resolves the primitive's
//! base-color texture. Meshes go through a [`MeshRegistry`], textures
//! through a [`TextureLoader`].
//!
//! Only triangle-list primitives are decoded. Index values are narrowed to
//! 16 bits; values above `u16::MAX` are truncated, not rejected.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gltf::accessor::{DataType, Dimensions};
use gltf::mesh::Mode;
use gltf::Semantic;

use crate::assets::mesh::DEFAULT_VERTEX_COLOR;
use crate::assets::{
    AssetError, AssetResult, ImageData, Mesh, MeshRegistry, Texture, TextureLoader,
    TextureSource, Vertex,
};

/// One decoded triangle primitive
#[derive(Debug, Clone)]
pub struct DecodedPrimitive {
    /// Registered mesh (`<mesh name>_prim<index>`)
    pub mesh: Arc<Mesh>,
    /// Base-color texture, if the primitive's material has one that resolved
    pub albedo: Option<Arc<Texture>>,
    /// Index of the glTF mesh the primitive belongs to
    pub mesh_index: usize,
    /// Index of the primitive within its mesh
    pub primitive_index: usize,
}

/// GLB decoder bound to the texture and mesh collaborators
pub struct GlbLoader<'a> {
    textures: &'a dyn TextureLoader,
    meshes: &'a dyn MeshRegistry,
}

impl<'a> GlbLoader<'a> {
    /// Create a decoder that registers into the given pools
    pub fn new(textures: &'a dyn TextureLoader, meshes: &'a dyn MeshRegistry) -> Self {
        Self { textures, meshes }
    }

    /// Read and decode a GLB file
    ///
    /// Fails with [`AssetError::Load`] when the file cannot be read or the
    /// container does not parse. Problems inside a single primitive are
    /// logged and that primitive is skipped.
    pub fn load(&self, path: &Path) -> AssetResult<Vec<DecodedPrimitive>> {
        let bytes = std::fs::read(path).map_err(|e| AssetError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.decode(path, &bytes)
    }

    /// Decode GLB bytes that were read from `source_path`
    ///
    /// `source_path` names embedded textures and anchors relative URIs.
    pub fn decode(&self, source_path: &Path, bytes: &[u8]) -> AssetResult<Vec<DecodedPrimitive>> {
        let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| AssetError::Load {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base_dir = source_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let buffers = BufferSet::resolve(&gltf.document, gltf.blob.as_deref(), &base_dir);

        let mut decoded = Vec::new();
        for mesh in gltf.document.meshes() {
            let mesh_name = mesh
                .name()
                .map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);

            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    log::debug!(
                        "Skipping non-triangle primitive {} of '{}' ({:?})",
                        primitive.index(),
                        mesh_name,
                        primitive.mode()
                    );
                    continue;
                }

                let name = format!("{}_prim{}", mesh_name, primitive.index());
                let (vertices, indices) = match decode_geometry(&buffers, &primitive) {
                    Ok(geometry) => geometry,
                    Err(e) => {
                        log::error!("Skipping primitive '{}' in {:?}: {}", name, source_path, e);
                        continue;
                    }
                };

                let albedo =
                    self.resolve_albedo(&buffers, &primitive, mesh.index(), source_path, &base_dir);
                let mesh_handle = self.meshes.register_mesh(&name, vertices, indices);

                decoded.push(DecodedPrimitive {
                    mesh: mesh_handle,
                    albedo,
                    mesh_index: mesh.index(),
                    primitive_index: primitive.index(),
                });
            }
        }

        log::info!("Decoded {} primitive(s) from {:?}", decoded.len(), source_path);
        Ok(decoded)
    }

    /// Resolve the base-color texture of a primitive's material
    ///
    /// External URIs go through the lazy texture cache. Embedded images are
    /// decoded here and stored under `<source path> <mesh index>`; that name
    /// does not include the primitive index, so primitives of one mesh with
    /// different embedded images share a pool entry (each still keeps its
    /// own texture).
    fn resolve_albedo(
        &self,
        buffers: &BufferSet<'_>,
        primitive: &gltf::Primitive<'_>,
        mesh_index: usize,
        source_path: &Path,
        base_dir: &Path,
    ) -> Option<Arc<Texture>> {
        let info = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_texture()?;

        match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } => {
                if uri.starts_with("data:") {
                    log::warn!("Data URI textures are not supported ({:?})", source_path);
                    return None;
                }

                let path = base_dir.join(uri);
                match self.textures.get_texture_2d_lazy(&path) {
                    Ok(texture) => Some(texture),
                    Err(e) => {
                        log::error!(
                            "Failed to load texture {:?} for {:?}: {}",
                            path,
                            source_path,
                            e
                        );
                        None
                    }
                }
            }
            gltf::image::Source::View { view, mime_type } => {
                let decoded = buffers
                    .view_bytes(&view)
                    .and_then(ImageData::from_bytes);
                match decoded {
                    Ok(image) => {
                        let name = format!("{} {}", source_path.display(), mesh_index);
                        let texture =
                            Arc::new(Texture::new(name.clone(), image, TextureSource::Embedded));
                        self.textures.store_texture_manually(Arc::clone(&texture), &name);
                        Some(texture)
                    }
                    Err(e) => {
                        log::error!(
                            "Failed to decode embedded {} texture in {:?}: {}",
                            mime_type,
                            source_path,
                            e
                        );
                        None
                    }
                }
            }
        }
    }
}

/// Decode the vertex and index streams of one triangle primitive
fn decode_geometry(
    buffers: &BufferSet<'_>,
    primitive: &gltf::Primitive<'_>,
) -> AssetResult<(Vec<Vertex>, Vec<u16>)> {
    let positions_accessor = primitive
        .get(&Semantic::Positions)
        .ok_or_else(|| AssetError::Format("primitive has no POSITION attribute".to_string()))?;
    let positions = buffers.read_vectors::<3>(&positions_accessor)?;

    let uvs = match primitive.get(&Semantic::TexCoords(0)) {
        Some(accessor) => Some(buffers.read_vectors::<2>(&accessor)?),
        None => None,
    };
    let colors = match primitive.get(&Semantic::Colors(0)) {
        Some(accessor) => Some(buffers.read_vectors::<3>(&accessor)?),
        None => None,
    };

    for (attribute, len) in [
        ("TEXCOORD_0", uvs.as_ref().map(Vec::len)),
        ("COLOR_0", colors.as_ref().map(Vec::len)),
    ] {
        if let Some(len) = len.filter(|&len| len != positions.len()) {
            log::warn!(
                "{} has {} elements for {} positions; missing entries use defaults",
                attribute,
                len,
                positions.len()
            );
        }
    }

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            uv: uvs.as_ref().and_then(|uvs| uvs.get(i).copied()).unwrap_or([0.0, 0.0]),
            color: colors
                .as_ref()
                .and_then(|colors| colors.get(i).copied())
                .unwrap_or(DEFAULT_VERTEX_COLOR),
        })
        .collect();

    let indices = match primitive.indices() {
        Some(accessor) => buffers.read_indices(&accessor)?,
        // Non-indexed triangle list: every three vertices form a triangle.
        None => (0..positions.len()).map(|i| i as u16).collect(),
    };

    Ok((vertices, indices))
}

/// Raw bytes of every buffer the document references
struct BufferSet<'a> {
    buffers: Vec<Option<Cow<'a, [u8]>>>,
}

impl<'a> BufferSet<'a> {
    fn resolve(document: &gltf::Document, blob: Option<&'a [u8]>, base_dir: &Path) -> Self {
        let buffers = document
            .buffers()
            .map(|buffer| match buffer.source() {
                gltf::buffer::Source::Bin => {
                    if blob.is_none() {
                        log::warn!("Buffer {} refers to a missing BIN chunk", buffer.index());
                    }
                    blob.map(Cow::Borrowed)
                }
                gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                    log::warn!("Data URI buffers are not supported (buffer {})", buffer.index());
                    None
                }
                gltf::buffer::Source::Uri(uri) => {
                    let path: PathBuf = base_dir.join(uri);
                    match std::fs::read(&path) {
                        Ok(bytes) => Some(Cow::Owned(bytes)),
                        Err(e) => {
                            log::error!("Failed to read buffer {:?}: {}", path, e);
                            None
                        }
                    }
                }
            })
            .collect();

        Self { buffers }
    }

    fn buffer(&self, index: usize) -> AssetResult<&[u8]> {
        self.buffers
            .get(index)
            .and_then(Option::as_deref)
            .ok_or_else(|| AssetError::Format(format!("buffer {index} is unavailable")))
    }

    /// Bytes covered by a buffer view
    fn view_bytes(&self, view: &gltf::buffer::View<'_>) -> AssetResult<&[u8]> {
        let data = self.buffer(view.buffer().index())?;
        let start = view.offset();
        start
            .checked_add(view.length())
            .and_then(|end| data.get(start..end))
            .ok_or_else(|| {
                AssetError::Format(format!(
                    "buffer view {} (offset {}, length {}) exceeds buffer of {} bytes",
                    view.index(),
                    start,
                    view.length(),
                    data.len()
                ))
            })
    }

    /// Locate an accessor's elements
    fn elements(&self, accessor: &gltf::Accessor<'_>) -> AssetResult<ElementSlice<'_>> {
        let view = accessor.view().ok_or_else(|| {
            AssetError::Format(format!(
                "accessor {} has no buffer view (sparse accessors are not supported)",
                accessor.index()
            ))
        })?;
        let bytes = self.view_bytes(&view)?;

        let component_size = accessor.data_type().size();
        let element_size = component_size * accessor.dimensions().multiplicity();
        let stride = view.stride().unwrap_or(element_size);
        let count = accessor.count();

        if count > 0 {
            // Counts and offsets come straight from the file; any overflow is out of range.
            let last_end = stride
                .checked_mul(count - 1)
                .and_then(|span| span.checked_add(accessor.offset()))
                .and_then(|end| end.checked_add(element_size));
            if !matches!(last_end, Some(end) if end <= bytes.len()) {
                return Err(AssetError::Format(format!(
                    "accessor {} (offset {}, count {}, stride {}) exceeds its view of {} bytes",
                    accessor.index(),
                    accessor.offset(),
                    count,
                    stride,
                    bytes.len()
                )));
            }
        }

        Ok(ElementSlice {
            bytes: &bytes[accessor.offset().min(bytes.len())..],
            stride,
            count,
            component_size,
            data_type: accessor.data_type(),
            normalized: accessor.normalized(),
        })
    }

    /// Read the first `N` components of every element as floats
    fn read_vectors<const N: usize>(
        &self,
        accessor: &gltf::Accessor<'_>,
    ) -> AssetResult<Vec<[f32; N]>> {
        let components = accessor.dimensions().multiplicity();
        if matches!(accessor.dimensions(), Dimensions::Mat2 | Dimensions::Mat3 | Dimensions::Mat4)
            || components < N
        {
            return Err(AssetError::Format(format!(
                "accessor {} is {:?}, expected at least {} components",
                accessor.index(),
                accessor.dimensions(),
                N
            )));
        }

        let elements = self.elements(accessor)?;
        Ok((0..elements.count)
            .map(|i| {
                let mut out = [0.0; N];
                for (c, value) in out.iter_mut().enumerate() {
                    *value = elements.component(i, c);
                }
                out
            })
            .collect())
    }

    /// Read an index accessor, narrowing every value to 16 bits
    fn read_indices(&self, accessor: &gltf::Accessor<'_>) -> AssetResult<Vec<u16>> {
        if accessor.dimensions() != Dimensions::Scalar {
            return Err(AssetError::Format(format!(
                "index accessor {} is {:?}, expected Scalar",
                accessor.index(),
                accessor.dimensions()
            )));
        }

        let elements = self.elements(accessor)?;
        let read: fn(&[u8]) -> u16 = match accessor.data_type() {
            DataType::U8 => |b: &[u8]| u16::from(b[0]),
            DataType::U16 => |b: &[u8]| u16::from_le_bytes([b[0], b[1]]),
            DataType::U32 => |b: &[u8]| u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as u16,
            other => {
                return Err(AssetError::Format(format!(
                    "unsupported index component type {other:?}"
                )))
            }
        };

        Ok((0..elements.count).map(|i| read(elements.raw(i, 0))).collect())
    }
}

/// Strided view over an accessor's elements
struct ElementSlice<'a> {
    bytes: &'a [u8],
    stride: usize,
    count: usize,
    component_size: usize,
    data_type: DataType,
    normalized: bool,
}

impl ElementSlice<'_> {
    fn raw(&self, element: usize, component: usize) -> &[u8] {
        let start = element * self.stride + component * self.component_size;
        &self.bytes[start..start + self.component_size]
    }

    /// Decode one component to `f32`, applying glTF normalization rules
    fn component(&self, element: usize, component: usize) -> f32 {
        let b = self.raw(element, component);
        match self.data_type {
            DataType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            DataType::U8 => {
                let v = f32::from(b[0]);
                if self.normalized { v / 255.0 } else { v }
            }
            DataType::I8 => {
                let v = f32::from(i8::from_le_bytes([b[0]]));
                if self.normalized { (v / 127.0).max(-1.0) } else { v }
            }
            DataType::U16 => {
                let v = f32::from(u16::from_le_bytes([b[0], b[1]]));
                if self.normalized { v / 65535.0 } else { v }
            }
            DataType::I16 => {
                let v = f32::from(i16::from_le_bytes([b[0], b[1]]));
                if self.normalized { (v / 32767.0).max(-1.0) } else { v }
            }
            DataType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32,
        }
    }
}
