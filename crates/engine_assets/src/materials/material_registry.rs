//! Material registry
//!
//! Caches materials by name and composite materials (everything decoded
//! from one GLB file) by source path. Decoding happens outside the lock;
//! the lock only covers map operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::material::{CompositeMaterial, MaterialData};
use crate::assets::{AssetError, AssetResult, GlbLoader, Mesh, MeshRegistry, Texture, TextureLoader};

#[derive(Default)]
struct MaterialTables {
    materials: HashMap<String, Arc<MaterialData>>,
    composites: HashMap<PathBuf, CompositeMaterial>,
}

/// Thread-safe material and composite material cache
pub struct MaterialRegistry {
    textures: Arc<dyn TextureLoader>,
    meshes: Arc<dyn MeshRegistry>,
    tables: Mutex<MaterialTables>,
}

impl MaterialRegistry {
    /// Create an empty registry decoding into the given pools
    pub fn new(textures: Arc<dyn TextureLoader>, meshes: Arc<dyn MeshRegistry>) -> Self {
        Self {
            textures,
            meshes,
            tables: Mutex::new(MaterialTables::default()),
        }
    }

    /// Register a material, or return the one already under `name`
    ///
    /// The first registration of a name wins; later calls with different
    /// arguments get the original back unchanged.
    pub fn register_material_data(
        &self,
        name: &str,
        mesh: Arc<Mesh>,
        albedo: Option<Arc<Texture>>,
    ) -> Arc<MaterialData> {
        let mut tables = self.lock();
        if let Some(existing) = tables.materials.get(name) {
            log::debug!("Material '{}' already registered", name);
            return Arc::clone(existing);
        }

        let material = Arc::new(MaterialData::new(name, mesh, albedo));
        tables.materials.insert(name.to_string(), Arc::clone(&material));
        material
    }

    /// Look up a material by name; a miss is not an error
    pub fn get_material_data(&self, name: &str) -> Option<Arc<MaterialData>> {
        self.lock().materials.get(name).cloned()
    }

    /// Decode a GLB file and register one material per triangle primitive
    ///
    /// Each material is named `<mesh name>_material` and the ordered list
    /// is stored as the composite for `path` once the whole file decoded.
    /// Decoding the same path again replaces the stored composite.
    pub fn load_and_register_composite_material_from_glb(
        &self,
        path: impl AsRef<Path>,
    ) -> AssetResult<CompositeMaterial> {
        let path = path.as_ref();
        let decoded = GlbLoader::new(self.textures.as_ref(), self.meshes.as_ref()).load(path)?;

        let materials: Vec<Arc<MaterialData>> = decoded
            .into_iter()
            .map(|primitive| {
                let name = format!("{}_material", primitive.mesh.name);
                self.register_material_data(&name, primitive.mesh, primitive.albedo)
            })
            .collect();

        let composite: CompositeMaterial = Arc::new(materials);
        log::info!("Registered composite material {:?} ({} materials)", path, composite.len());

        self.lock()
            .composites
            .insert(path.to_path_buf(), Arc::clone(&composite));
        Ok(composite)
    }

    /// Composite material previously decoded from `path`
    pub fn get_composite_material_data(
        &self,
        path: impl AsRef<Path>,
    ) -> AssetResult<CompositeMaterial> {
        let path = path.as_ref();
        self.lock()
            .composites
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(format!("composite material {}", path.display())))
    }

    /// Whether a composite is stored for `path`
    pub fn contains_composite(&self, path: impl AsRef<Path>) -> bool {
        self.lock().composites.contains_key(path.as_ref())
    }

    /// Number of named materials
    pub fn material_count(&self) -> usize {
        self.lock().materials.len()
    }

    /// Number of stored composites
    pub fn composite_count(&self) -> usize {
        self.lock().composites.len()
    }

    /// Drop the registry's references to every material and composite
    pub fn flush(&self) {
        let mut tables = self.lock();
        tables.materials.clear();
        tables.composites.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MaterialTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_glb::{png_bytes, primitive, GlbBuilder};
    use crate::assets::{MeshPool, TexturePool};
    use serde_json::json;
    use tempfile::TempDir;

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    fn registry() -> (MaterialRegistry, Arc<TexturePool>, Arc<MeshPool>) {
        let textures = Arc::new(TexturePool::new());
        let meshes = Arc::new(MeshPool::new());
        let registry = MaterialRegistry::new(textures.clone(), meshes.clone());
        (registry, textures, meshes)
    }

    fn mesh(name: &str) -> Arc<Mesh> {
        Arc::new(Mesh::new(name, Vec::new(), Vec::new()))
    }

    fn write_glb(dir: &Path, name: &str, bytes: Vec<u8>) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_first_registration_wins() {
        let (registry, _, _) = registry();
        let first = registry.register_material_data("hull", mesh("a"), None);
        let second = registry.register_material_data("hull", mesh("b"), None);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.mesh().name, "a");
        assert_eq!(registry.material_count(), 1);
    }

    #[test]
    fn test_flush_forgets_materials_but_not_handles() {
        let (registry, _, _) = registry();
        let held = registry.register_material_data("hull", mesh("a"), None);

        registry.flush();
        assert!(registry.get_material_data("hull").is_none());
        assert_eq!(held.name(), "hull");
    }

    #[test]
    fn test_lookup_asymmetry() {
        let (registry, _, _) = registry();
        assert!(registry.get_material_data("missing").is_none());
        assert!(matches!(
            registry.get_composite_material_data("missing.glb"),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn test_positions_only_glb_yields_one_material() {
        let dir = TempDir::new().unwrap();
        let mut glb = GlbBuilder::new();
        let pos = glb.positions(&TRIANGLE);
        glb.mesh(Some("Rock"), vec![primitive(json!({ "POSITION": pos }), None, None, None)]);
        let path = write_glb(dir.path(), "rock.glb", glb.build());

        let (registry, _, meshes) = registry();
        let composite = registry.load_and_register_composite_material_from_glb(&path).unwrap();

        assert_eq!(composite.len(), 1);
        let material = &composite[0];
        assert_eq!(material.name(), "Rock_prim0_material");
        assert_eq!(material.mesh().vertex_count(), 3);
        assert!(material
            .mesh()
            .vertices
            .iter()
            .all(|v| v.uv == [0.0, 0.0] && v.color == [1.0, 1.0, 1.0]));
        assert!(material.albedo().is_none());

        let by_name = registry.get_material_data("Rock_prim0_material").unwrap();
        assert!(Arc::ptr_eq(&by_name, material));
        assert!(meshes.get_mesh("Rock_prim0").is_some());

        let stored = registry.get_composite_material_data(&path).unwrap();
        assert!(Arc::ptr_eq(&stored, &composite));
        assert!(registry.contains_composite(&path));
    }

    #[test]
    fn test_composite_keeps_decode_order_and_textures() {
        let dir = TempDir::new().unwrap();
        let mut glb = GlbBuilder::new();
        let pos = glb.positions(&TRIANGLE);
        let material = glb.embedded_texture_material(&png_bytes(1, 1, [200, 0, 0, 255]));
        glb.mesh(Some("Body"), vec![
            primitive(json!({ "POSITION": pos }), None, Some(material), None),
            primitive(json!({ "POSITION": pos }), None, None, None),
        ]);
        glb.mesh(Some("Wheel"), vec![primitive(json!({ "POSITION": pos }), None, None, None)]);
        let path = write_glb(dir.path(), "car.glb", glb.build());

        let (registry, textures, _) = registry();
        let composite = registry.load_and_register_composite_material_from_glb(&path).unwrap();

        let names: Vec<&str> = composite.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec!["Body_prim0_material", "Body_prim1_material", "Wheel_prim0_material"]
        );
        assert!(composite[0].albedo().unwrap().is_embedded());
        assert!(composite[1].albedo().is_none());
        assert!(textures.get_texture(&format!("{} 0", path.display())).is_some());
        assert_eq!(registry.material_count(), 3);
        assert_eq!(registry.composite_count(), 1);
    }

    #[test]
    fn test_reloading_reuses_registered_materials() {
        let dir = TempDir::new().unwrap();
        let mut glb = GlbBuilder::new();
        let pos = glb.positions(&TRIANGLE);
        glb.mesh(Some("Rock"), vec![primitive(json!({ "POSITION": pos }), None, None, None)]);
        let path = write_glb(dir.path(), "rock.glb", glb.build());

        let (registry, _, _) = registry();
        let first = registry.load_and_register_composite_material_from_glb(&path).unwrap();
        let second = registry.load_and_register_composite_material_from_glb(&path).unwrap();

        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(registry.composite_count(), 1);
    }

    #[test]
    fn test_unparseable_glb_is_load_error_and_not_stored() {
        let dir = TempDir::new().unwrap();
        let path = write_glb(dir.path(), "broken.glb", b"glTF but not really".to_vec());

        let (registry, _, _) = registry();
        let result = registry.load_and_register_composite_material_from_glb(&path);

        assert!(matches!(result, Err(AssetError::Load { .. })));
        assert!(!registry.contains_composite(&path));
        assert_eq!(registry.material_count(), 0);
    }

    #[test]
    fn test_concurrent_registration_converges() {
        let (registry, _, _) = registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.register_material_data("shared", mesh(&format!("m{i}")), None)
                })
            })
            .collect();
        let materials: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(materials.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
        assert_eq!(registry.material_count(), 1);
    }
}
