//! CPU-side geometry plus the backend buffers that mirror it.
//!
//! A [`Mesh`] owns no GPU objects implicitly: whatever `setup` allocates
//! stays alive until `delete` is called with the same backend.

use crate::backend::{BackendError, Handle, ResourceBackend};
use crate::sprite::SubTexture;
use crate::vertex::{PosTexColorVertex, VERTEX_STRIDE, WHITE};
use glam::Vec2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("mesh has not been set up")]
    NotSetUp,

    #[error("mesh already owns live buffers")]
    AlreadySetUp,

    #[error("mesh has no vertex data")]
    NoVertices,

    #[error("texture {0:?} is not known to the backend")]
    UnknownTexture(Handle),
}

pub type Result<T> = std::result::Result<T, MeshError>;

/// Index pattern of [`Mesh::new_indexed`].
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 3, 1];

/// Not `Clone`: the buffer and texture handles are owned, and deleting two
/// copies would free a slot the backend may already have reissued.
///
/// ```compile_fail
/// fn owned_handles<T: Clone>() {}
/// owned_handles::<tessel_render::Mesh>();
/// ```
#[derive(Debug)]
pub struct Mesh {
    pub vertex: Vec<PosTexColorVertex>,
    pub index: Vec<u16>,
    pub texture: Handle,
    pub vertex_buffer: Handle,
    pub index_buffer: Handle,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertex: Vec::new(),
            index: Vec::new(),
            texture: Handle::INVALID,
            vertex_buffer: Handle::INVALID,
            index_buffer: Handle::INVALID,
        }
    }
}

impl Mesh {
    pub fn new(vertex: Vec<PosTexColorVertex>, index: Vec<u16>, texture: Handle) -> Self {
        Self {
            vertex,
            index,
            texture,
            ..Self::default()
        }
    }

    /// Allocate backend buffers from the CPU arrays.
    ///
    /// The index buffer is only created when there are indices. If any
    /// allocation fails, everything allocated so far is released and both
    /// buffer handles stay [`Handle::INVALID`].
    pub fn setup(&mut self, backend: &mut impl ResourceBackend) -> Result<()> {
        if self.vertex_buffer.is_valid() || self.index_buffer.is_valid() {
            return Err(MeshError::AlreadySetUp);
        }
        if self.vertex.is_empty() {
            return Err(MeshError::NoVertices);
        }

        let vertex_buffer =
            backend.alloc_vertex_buffer(bytemuck::cast_slice(&self.vertex), VERTEX_STRIDE)?;

        if !self.index.is_empty() {
            match backend.alloc_index_buffer(bytemuck::cast_slice(&self.index)) {
                Ok(handle) => self.index_buffer = handle,
                Err(e) => {
                    tracing::warn!(error = %e, "index buffer allocation failed");
                    backend.destroy(vertex_buffer);
                    return Err(e.into());
                }
            }
        }
        self.vertex_buffer = vertex_buffer;

        tracing::trace!(
            vertices = self.vertex.len(),
            indices = self.index.len(),
            "mesh set up"
        );
        Ok(())
    }

    /// Publish the CPU arrays into the existing buffers at offset 0.
    pub fn update(&self, backend: &mut impl ResourceBackend) -> Result<()> {
        if !self.vertex_buffer.is_valid() {
            return Err(MeshError::NotSetUp);
        }
        backend.update(
            self.vertex_buffer,
            0,
            bytemuck::cast_slice(&self.vertex),
            false,
        )?;
        if self.index_buffer.is_valid() {
            backend.update(self.index_buffer, 0, bytemuck::cast_slice(&self.index), false)?;
        }
        Ok(())
    }

    /// Replace the CPU vertices. GPU state is untouched.
    pub fn set_vertex(&mut self, vertex: Vec<PosTexColorVertex>) {
        self.vertex = vertex;
    }

    /// Replace the CPU indices. GPU state is untouched.
    pub fn set_index(&mut self, index: Vec<u16>) {
        self.index = index;
    }

    /// Move every CPU vertex by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        for v in &mut self.vertex {
            v.x += offset.x;
            v.y += offset.y;
        }
    }

    /// Release the index buffer, vertex buffer and texture this mesh
    /// references. Returns how many resources the backend actually freed;
    /// calling it again returns 0.
    pub fn delete(&mut self, backend: &mut impl ResourceBackend) -> usize {
        let mut released = 0;
        for handle in [
            &mut self.index_buffer,
            &mut self.vertex_buffer,
            &mut self.texture,
        ] {
            if handle.is_valid() && backend.destroy(*handle) {
                released += 1;
            }
            *handle = Handle::INVALID;
        }
        released
    }

    pub fn is_set_up(&self) -> bool {
        self.vertex_buffer.is_valid()
    }

    // === Quad factories ===

    /// Two non-indexed triangles covering `[0,w]×[0,h]` with full UVs.
    pub fn quad_with_size(texture: Handle, width: f32, height: f32) -> Self {
        Self::new(quad_vertices(width, height, [0.0, 0.0], [1.0, 1.0]), Vec::new(), texture)
    }

    /// Whole-texture quad sized to the texture.
    pub fn new_quad(backend: &impl ResourceBackend, texture: Handle) -> Result<Self> {
        let info = backend
            .texture(texture)
            .ok_or(MeshError::UnknownTexture(texture))?;
        Ok(Self::quad_with_size(
            texture,
            info.width as f32,
            info.height as f32,
        ))
    }

    /// Quad sized to `sub`, with UVs mapped into its region of the parent.
    pub fn new_sub_quad(sub: &SubTexture) -> Self {
        let size = sub.size();
        let region = sub.region();
        Self::new(
            quad_vertices(
                size.width,
                size.height,
                [region.x1, region.y1],
                [region.x2, region.y2],
            ),
            Vec::new(),
            sub.id(),
        )
    }

    /// Four shared vertices plus [`QUAD_INDICES`].
    pub fn new_indexed(texture: Handle, width: f32, height: f32) -> Self {
        let (w, h) = (width, height);
        let vertex = vec![
            PosTexColorVertex::new(0.0, h, 0.0, 1.0, WHITE),
            PosTexColorVertex::new(w, 0.0, 1.0, 0.0, WHITE),
            PosTexColorVertex::new(0.0, 0.0, 0.0, 0.0, WHITE),
            PosTexColorVertex::new(w, h, 1.0, 1.0, WHITE),
        ];
        Self::new(vertex, QUAD_INDICES.to_vec(), texture)
    }
}

fn quad_vertices(w: f32, h: f32, uv_min: [f32; 2], uv_max: [f32; 2]) -> Vec<PosTexColorVertex> {
    let [u0, v0] = uv_min;
    let [u1, v1] = uv_max;
    vec![
        PosTexColorVertex::new(0.0, h, u0, v1, WHITE),
        PosTexColorVertex::new(w, 0.0, u1, v0, WHITE),
        PosTexColorVertex::new(0.0, 0.0, u0, v0, WHITE),
        PosTexColorVertex::new(0.0, h, u0, v1, WHITE),
        PosTexColorVertex::new(w, h, u1, v1, WHITE),
        PosTexColorVertex::new(w, 0.0, u1, v0, WHITE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::sprite::Texture;
    use approx::assert_abs_diff_eq;

    #[test]
    fn whole_texture_quad_covers_texture() {
        let mut backend = HeadlessBackend::new();
        let tex = backend.alloc_texture(4, 2, &[0; 32]).unwrap();
        let mesh = Mesh::new_quad(&backend, tex).unwrap();

        assert_eq!(mesh.vertex.len(), 6);
        assert!(mesh.index.is_empty());
        let max_x = mesh.vertex.iter().map(|v| v.x).fold(0.0, f32::max);
        let max_y = mesh.vertex.iter().map(|v| v.y).fold(0.0, f32::max);
        assert_eq!((max_x, max_y), (4.0, 2.0));
        assert!(mesh.vertex.iter().all(|v| (0.0..=1.0).contains(&v.u)));
    }

    #[test]
    fn unknown_texture_is_rejected() {
        let backend = HeadlessBackend::new();
        assert!(matches!(
            Mesh::new_quad(&backend, Handle::from_raw(9)),
            Err(MeshError::UnknownTexture(_))
        ));
    }

    #[test]
    fn sub_quad_remaps_uvs() {
        let parent = Texture::new(Handle::from_raw(0), 100.0, 100.0);
        let sub = SubTexture::new(&parent, 10.0, 20.0, 20.0, 30.0);
        let mesh = Mesh::new_sub_quad(&sub);

        let (min_u, max_u) = mesh
            .vertex
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v.u), hi.max(v.u)));
        let (min_v, max_v) = mesh
            .vertex
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v.v), hi.max(v.v)));
        assert_abs_diff_eq!(min_u, 0.10, epsilon = 1e-6);
        assert_abs_diff_eq!(max_u, 0.30, epsilon = 1e-6);
        assert_abs_diff_eq!(min_v, 0.20, epsilon = 1e-6);
        assert_abs_diff_eq!(max_v, 0.50, epsilon = 1e-6);

        // Corner at the local origin samples the region's min corner.
        let origin = mesh.vertex[2];
        assert_eq!((origin.x, origin.y), (0.0, 0.0));
        assert_abs_diff_eq!(origin.u, 0.10, epsilon = 1e-6);
        assert_abs_diff_eq!(origin.v, 0.20, epsilon = 1e-6);
    }

    #[test]
    fn indexed_quad_shares_vertices() {
        let mesh = Mesh::new_indexed(Handle::INVALID, 8.0, 8.0);
        assert_eq!(mesh.vertex.len(), 4);
        assert_eq!(mesh.index, vec![0, 1, 2, 0, 3, 1]);
    }

    #[test]
    fn setup_update_and_delete_once() {
        let mut backend = HeadlessBackend::new();
        let tex = backend.alloc_texture(1, 1, &[255; 4]).unwrap();
        let mut mesh = Mesh::new_indexed(tex, 2.0, 2.0);

        mesh.setup(&mut backend).unwrap();
        assert!(mesh.is_set_up());
        assert_eq!(backend.live_resources(), 3);
        assert!(matches!(mesh.setup(&mut backend), Err(MeshError::AlreadySetUp)));

        mesh.translate(Vec2::new(1.0, 1.0));
        mesh.update(&mut backend).unwrap();
        let bytes = backend.buffer_bytes(mesh.vertex_buffer).unwrap();
        let uploaded: &[PosTexColorVertex] = bytemuck::cast_slice(bytes);
        assert_eq!((uploaded[2].x, uploaded[2].y), (1.0, 1.0));

        assert_eq!(mesh.delete(&mut backend), 3);
        assert_eq!(mesh.delete(&mut backend), 0, "second delete is a no-op");
        assert_eq!(backend.live_resources(), 0);
        assert_eq!(backend.stats().destroys, 3);
    }

    #[test]
    fn set_arrays_wait_for_update() {
        let mut backend = HeadlessBackend::new();
        let mut mesh = Mesh::new_indexed(Handle::INVALID, 2.0, 2.0);
        mesh.setup(&mut backend).unwrap();
        let vertex_before = backend.buffer_bytes(mesh.vertex_buffer).unwrap().to_vec();
        let index_before = backend.buffer_bytes(mesh.index_buffer).unwrap().to_vec();
        let updates = backend.stats().updates;

        let mut moved = mesh.vertex.clone();
        for v in &mut moved {
            v.x += 5.0;
        }
        mesh.set_vertex(moved);
        mesh.set_index(vec![1, 0, 3, 1, 2, 0]);

        assert_eq!(backend.buffer_bytes(mesh.vertex_buffer).unwrap(), &vertex_before[..]);
        assert_eq!(backend.buffer_bytes(mesh.index_buffer).unwrap(), &index_before[..]);
        assert_eq!(backend.stats().updates, updates);

        mesh.update(&mut backend).unwrap();
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertex);
        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.index);
        assert_eq!(backend.buffer_bytes(mesh.vertex_buffer).unwrap(), vertex_bytes);
        assert_eq!(backend.buffer_bytes(mesh.index_buffer).unwrap(), index_bytes);
        assert_ne!(&vertex_before[..], vertex_bytes);
    }

    #[test]
    fn delete_without_setup_is_harmless() {
        let mut backend = HeadlessBackend::new();
        let mut mesh = Mesh::default();
        assert_eq!(mesh.delete(&mut backend), 0);
        assert!(matches!(mesh.update(&mut backend), Err(MeshError::NotSetUp)));
    }

    #[test]
    fn failed_setup_leaves_handles_invalid() {
        let mut backend = HeadlessBackend::with_limit(1);
        let mut mesh = Mesh::new_indexed(Handle::INVALID, 2.0, 2.0);

        assert!(matches!(
            mesh.setup(&mut backend),
            Err(MeshError::Backend(BackendError::Exhausted { .. }))
        ));
        assert!(!mesh.vertex_buffer.is_valid());
        assert!(!mesh.index_buffer.is_valid());
        assert_eq!(backend.live_resources(), 0);
    }
}
