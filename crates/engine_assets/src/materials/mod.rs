//! Material registration
//!
//! [`MaterialData`] ties a pooled mesh to its albedo texture and a lazily
//! allocated descriptor binding. [`MaterialRegistry`] caches materials by
//! name and GLB composites by path.

pub mod descriptor;
pub mod material;
pub mod material_registry;

pub use descriptor::{DescriptorAllocator, DescriptorBinding, HeadlessDescriptorAllocator};
pub use material::{CompositeMaterial, MaterialData};
pub use material_registry::MaterialRegistry;
