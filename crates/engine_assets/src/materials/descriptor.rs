//! GPU descriptor binding handles
//!
//! A material's descriptor binding is device specific and created on first
//! bind. The allocator behind it is a trait so renderers plug in their own
//! backend; [`HeadlessDescriptorAllocator`] hands out plain ids.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::{AssetResult, Texture};

/// Opaque handle to a material's descriptor set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBinding(u64);

impl DescriptorBinding {
    /// Wrap a backend handle
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Backend handle value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Creates descriptor bindings for materials
pub trait DescriptorAllocator: Send + Sync {
    /// Allocate a binding for a material sampling `albedo` (if any)
    fn allocate(&self, albedo: Option<&Texture>) -> AssetResult<DescriptorBinding>;
}

/// Allocator without a device: bindings are sequential ids starting at 1
#[derive(Debug, Default)]
pub struct HeadlessDescriptorAllocator {
    next: AtomicU64,
}

impl HeadlessDescriptorAllocator {
    /// Create an allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings handed out so far
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl DescriptorAllocator for HeadlessDescriptorAllocator {
    fn allocate(&self, albedo: Option<&Texture>) -> AssetResult<DescriptorBinding> {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!(
            "Allocated descriptor binding {} (albedo: {})",
            id,
            albedo.map_or("none", Texture::name)
        );
        Ok(DescriptorBinding(id))
    }
}
