//! Material data: a mesh, its albedo texture and a lazily created binding

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::descriptor::{DescriptorAllocator, DescriptorBinding};
use crate::assets::{AssetResult, Mesh, Texture};

/// Materials decoded from one model file, in decode order
pub type CompositeMaterial = Arc<Vec<Arc<MaterialData>>>;

/// A renderable material
///
/// Mesh and texture are shared with their pools. The descriptor binding
/// belongs to this material and is created the first time it is requested.
pub struct MaterialData {
    name: String,
    mesh: Arc<Mesh>,
    albedo: Option<Arc<Texture>>,
    binding: Mutex<Option<DescriptorBinding>>,
}

impl MaterialData {
    /// Create a material with no binding yet
    pub fn new(name: impl Into<String>, mesh: Arc<Mesh>, albedo: Option<Arc<Texture>>) -> Self {
        Self {
            name: name.into(),
            mesh,
            albedo,
            binding: Mutex::new(None),
        }
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared mesh
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Shared albedo texture, if any
    pub fn albedo(&self) -> Option<&Arc<Texture>> {
        self.albedo.as_ref()
    }

    /// Binding created so far, without allocating one
    pub fn binding(&self) -> Option<DescriptorBinding> {
        *self.binding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the descriptor binding, allocating it on first use
    ///
    /// Later calls return the same binding regardless of allocator. A
    /// failed allocation leaves the material unbound so it can be retried.
    pub fn descriptor_binding(
        &self,
        allocator: &dyn DescriptorAllocator,
    ) -> AssetResult<DescriptorBinding> {
        let mut binding = self.binding.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = *binding {
            return Ok(existing);
        }

        let created = allocator.allocate(self.albedo.as_deref())?;
        log::debug!("Material '{}' bound to descriptor {}", self.name, created.raw());
        *binding = Some(created);
        Ok(created)
    }
}

impl fmt::Debug for MaterialData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialData")
            .field("name", &self.name)
            .field("mesh", &self.mesh.name)
            .field("albedo", &self.albedo.as_ref().map(|t| t.name()))
            .field("binding", &self.binding())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::materials::HeadlessDescriptorAllocator;

    struct FailingAllocator;

    impl DescriptorAllocator for FailingAllocator {
        fn allocate(&self, _albedo: Option<&Texture>) -> AssetResult<DescriptorBinding> {
            Err(AssetError::Resource("descriptor pool exhausted".to_string()))
        }
    }

    fn material() -> MaterialData {
        let mesh = Arc::new(Mesh::new("hull", Vec::new(), Vec::new()));
        MaterialData::new("hull_material", mesh, None)
    }

    #[test]
    fn test_binding_is_created_once() {
        let allocator = HeadlessDescriptorAllocator::new();
        let material = material();
        assert_eq!(material.binding(), None);

        let first = material.descriptor_binding(&allocator).unwrap();
        let second = material.descriptor_binding(&allocator).unwrap();

        assert_eq!(first, second);
        assert_eq!(material.binding(), Some(first));
        assert_eq!(allocator.allocated(), 1);
    }

    #[test]
    fn test_failed_allocation_can_be_retried() {
        let material = material();
        assert!(material.descriptor_binding(&FailingAllocator).is_err());
        assert_eq!(material.binding(), None);

        let allocator = HeadlessDescriptorAllocator::new();
        assert!(material.descriptor_binding(&allocator).is_ok());
    }
}
