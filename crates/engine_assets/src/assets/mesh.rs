//! Mesh representation and mesh pool
//!
//! Meshes are plain CPU-side vertex/index streams. GPU buffer creation
//! happens behind the [`MeshRegistry`] seam; [`MeshPool`] is the in-process
//! implementation that deduplicates meshes by name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytemuck::{Pod, Zeroable};

/// Vertex color used when a source provides none
pub const DEFAULT_VERTEX_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// 3D vertex with position, texture coordinates and color
///
/// `#[repr(C)]` keeps the layout stable for GPU buffer uploads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Linear RGB color
    pub color: [f32; 3],
}

impl Vertex {
    /// Create a vertex with all attributes given
    pub const fn new(position: [f32; 3], uv: [f32; 2], color: [f32; 3]) -> Self {
        Self { position, uv, color }
    }

    /// Create a vertex with zero UVs and opaque white color
    pub const fn from_position(position: [f32; 3]) -> Self {
        Self::new(position, [0.0, 0.0], DEFAULT_VERTEX_COLOR)
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Registry name
    pub name: String,
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle list indices
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Create a mesh
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u16>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex data as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Mesh registration collaborator used by the GLB decoder
pub trait MeshRegistry: Send + Sync {
    /// Register a mesh under `name`, or return the one already registered
    fn register_mesh(&self, name: &str, vertices: Vec<Vertex>, indices: Vec<u16>) -> Arc<Mesh>;

    /// Look up a mesh by name
    fn get_mesh(&self, name: &str) -> Option<Arc<Mesh>>;
}

/// Thread-safe name-keyed mesh cache
#[derive(Default)]
pub struct MeshPool {
    meshes: Mutex<HashMap<String, Arc<Mesh>>>,
}

impl MeshPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered meshes
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the pool's references to every mesh
    pub fn flush(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Mesh>>> {
        self.meshes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MeshRegistry for MeshPool {
    fn register_mesh(&self, name: &str, vertices: Vec<Vertex>, indices: Vec<u16>) -> Arc<Mesh> {
        let mut meshes = self.lock();
        if let Some(existing) = meshes.get(name) {
            log::debug!("Mesh '{}' already registered, reusing", name);
            return Arc::clone(existing);
        }

        let mesh = Arc::new(Mesh::new(name, vertices, indices));
        log::debug!(
            "Registered mesh '{}' ({} vertices, {} triangles)",
            name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        meshes.insert(name.to_string(), Arc::clone(&mesh));
        mesh
    }

    fn get_mesh(&self, name: &str) -> Option<Arc<Mesh>> {
        self.lock().get(name).cloned()
    }
}
