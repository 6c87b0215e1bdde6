//! Batch renderer
//!
//! Collects quads into one working vertex buffer and splits them into
//! [`BatchCommand`]s, one per bound texture run. A run longer than the
//! per-draw vertex capacity is split so every command stays addressable
//! with 16-bit indices.

use crate::backend::{BackendError, Handle, ResourceBackend};
use crate::settings::{RenderSettings, MAX_BATCH_VERTICES};
use crate::vertex::{PosTexColorVertex, VERTEX_STRIDE};

/// Something that writes its own vertices into a batch.
pub trait BatchObject {
    /// Vertices written by [`fill`](Self::fill).
    fn size(&self) -> usize {
        4
    }

    /// `out` is exactly [`size`](Self::size) vertices long.
    fn fill(&self, out: &mut [PosTexColorVertex]);
}

/// Consumer of `begin / draw* / end` runs.
pub trait BatchRender {
    fn begin(&mut self, texture: Handle);

    fn draw(&mut self, object: &dyn BatchObject);

    fn end(&mut self);

    /// Finish the frame. Returns the number of batches issued.
    fn flush(&mut self) -> usize;
}

/// One draw call: a contiguous vertex range sharing a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCommand {
    pub texture: Handle,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

impl BatchCommand {
    /// Quads in this command.
    pub fn quads(&self) -> u32 {
        self.vertex_count / 4
    }
}

pub struct BatchRenderer {
    capacity: usize,
    vertices: Vec<PosTexColorVertex>,
    commands: Vec<BatchCommand>,
    open: Option<BatchCommand>,
    frame_vertices: Vec<PosTexColorVertex>,
    frame_commands: Vec<BatchCommand>,
    dropped: usize,
    frame_dropped: usize,
    vertex_buffer: Handle,
    index_buffer: Handle,
}

impl BatchRenderer {
    /// `max_batch_vertices` is rounded down to whole quads (at least one)
    /// and capped at [`MAX_BATCH_VERTICES`].
    pub fn new(max_batch_vertices: usize) -> Self {
        let capacity = (max_batch_vertices.min(MAX_BATCH_VERTICES) / 4).max(1) * 4;
        Self {
            capacity,
            vertices: Vec::with_capacity(capacity),
            commands: Vec::new(),
            open: None,
            frame_vertices: Vec::with_capacity(capacity),
            frame_commands: Vec::new(),
            dropped: 0,
            frame_dropped: 0,
            vertex_buffer: Handle::INVALID,
            index_buffer: Handle::INVALID,
        }
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(settings.max_batch_vertices)
    }

    /// Vertices a single command may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Commands issued by the most recent flush.
    pub fn last_frame(&self) -> &[BatchCommand] {
        &self.frame_commands
    }

    /// Vertices of the most recent flush, indexed by the commands' ranges.
    pub fn last_vertices(&self) -> &[PosTexColorVertex] {
        &self.frame_vertices
    }

    /// Objects rejected during the most recent flushed frame (drawn
    /// outside a batch or too large).
    pub fn dropped(&self) -> usize {
        self.frame_dropped
    }

    pub fn vertex_buffer(&self) -> Handle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Handle {
        self.index_buffer
    }

    /// Allocate a dynamic vertex buffer for one full batch and a static
    /// index buffer covering it.
    ///
    /// Buffers that are still live are kept, so calling this again after a
    /// failed [`upload`](Self::upload) only replaces the vertex buffer. On
    /// failure both handles are left invalid.
    pub fn setup(&mut self, backend: &mut impl ResourceBackend) -> Result<(), BackendError> {
        if self.vertex_buffer.is_valid() && self.index_buffer.is_valid() {
            return Ok(());
        }

        if !self.index_buffer.is_valid() {
            let indices = quad_indices(self.capacity / 4);
            self.index_buffer = backend.alloc_index_buffer(bytemuck::cast_slice(&indices))?;
        }

        if !self.vertex_buffer.is_valid() {
            let zeroed = vec![0u8; self.capacity * VERTEX_STRIDE as usize];
            match backend.alloc_vertex_buffer(&zeroed, VERTEX_STRIDE) {
                Ok(vertex_buffer) => self.vertex_buffer = vertex_buffer,
                Err(e) => {
                    tracing::warn!(error = %e, "batch vertex buffer allocation failed");
                    self.release(backend);
                    return Err(e);
                }
            }
        }
        tracing::debug!(capacity = self.capacity, "batch renderer buffers allocated");
        Ok(())
    }

    /// Push the last flushed frame into the vertex buffer. The buffer is
    /// reallocated when the frame outgrows it. Returns bytes written.
    pub fn upload(&mut self, backend: &mut impl ResourceBackend) -> Result<usize, BackendError> {
        if !self.vertex_buffer.is_valid() {
            return Err(BackendError::UnknownHandle(self.vertex_buffer));
        }
        if self.frame_vertices.is_empty() {
            return Ok(0);
        }

        let bytes: &[u8] = bytemuck::cast_slice(&self.frame_vertices);
        let size = backend
            .vertex_buffer(self.vertex_buffer)
            .map(|info| info.size as usize)
            .ok_or(BackendError::UnknownHandle(self.vertex_buffer))?;

        if bytes.len() > size {
            backend.destroy(self.vertex_buffer);
            self.vertex_buffer = Handle::INVALID;
            self.vertex_buffer = backend.alloc_vertex_buffer(bytes, VERTEX_STRIDE)?;
            tracing::debug!(bytes = bytes.len(), "batch vertex buffer grown");
        }
        backend.update(self.vertex_buffer, 0, bytes, true)?;
        Ok(bytes.len())
    }

    /// Free the backend buffers. Returns how many were released.
    pub fn release(&mut self, backend: &mut impl ResourceBackend) -> usize {
        let mut released = 0;
        for handle in [&mut self.vertex_buffer, &mut self.index_buffer] {
            if backend.destroy(*handle) {
                released += 1;
            }
            *handle = Handle::INVALID;
        }
        released
    }

    fn close(&mut self) {
        if let Some(open) = self.open.take() {
            if open.vertex_count > 0 {
                self.commands.push(open);
            }
        }
    }
}

impl BatchRender for BatchRenderer {
    fn begin(&mut self, texture: Handle) {
        if self.open.is_some() {
            tracing::warn!(?texture, "begin while a batch is open; closing it");
            self.close();
        }
        self.open = Some(BatchCommand {
            texture,
            first_vertex: self.vertices.len() as u32,
            vertex_count: 0,
        });
    }

    fn draw(&mut self, object: &dyn BatchObject) {
        let Some(mut open) = self.open else {
            tracing::warn!("draw outside begin/end; dropped");
            self.dropped += 1;
            return;
        };
        let n = object.size();
        if n > self.capacity {
            tracing::warn!(vertices = n, capacity = self.capacity, "object exceeds batch capacity; dropped");
            self.dropped += 1;
            return;
        }

        if open.vertex_count as usize + n > self.capacity {
            self.commands.push(open);
            open = BatchCommand {
                texture: open.texture,
                first_vertex: self.vertices.len() as u32,
                vertex_count: 0,
            };
        }

        let start = self.vertices.len();
        self.vertices.resize(start + n, PosTexColorVertex::default());
        object.fill(&mut self.vertices[start..]);
        open.vertex_count += n as u32;
        self.open = Some(open);
    }

    fn end(&mut self) {
        self.close();
    }

    fn flush(&mut self) -> usize {
        if self.open.is_some() {
            tracing::warn!("flush with an open batch; closing it");
            self.close();
        }
        std::mem::swap(&mut self.vertices, &mut self.frame_vertices);
        std::mem::swap(&mut self.commands, &mut self.frame_commands);
        self.vertices.clear();
        self.commands.clear();
        self.frame_dropped = std::mem::take(&mut self.dropped);
        self.frame_commands.len()
    }
}

/// `3,0,1, 3,1,2` per quad, for corners ordered bottom-left,
/// bottom-right, top-right, top-left.
///
/// At most `MAX_BATCH_VERTICES / 4` quads are addressable; the count is
/// capped there.
pub fn quad_indices(quads: usize) -> Vec<u16> {
    debug_assert!(quads <= MAX_BATCH_VERTICES / 4, "{quads} quads overflow u16 indices");
    let quads = quads.min(MAX_BATCH_VERTICES / 4);
    let mut out = Vec::with_capacity(quads * 6);
    for base in (0..quads * 4).step_by(4) {
        let Ok(b) = u16::try_from(base) else {
            break;
        };
        out.extend_from_slice(&[b + 3, b, b + 1, b + 3, b + 1, b + 2]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferInfo, HeadlessBackend, ResourceKind, TextureInfo};

    /// Headless backend whose vertex buffer allocations start failing once
    /// `vertex_allocs_left` reaches zero.
    struct FailingBackend {
        inner: HeadlessBackend,
        vertex_allocs_left: usize,
    }

    impl FailingBackend {
        fn new(vertex_allocs_left: usize) -> Self {
            Self {
                inner: HeadlessBackend::new(),
                vertex_allocs_left,
            }
        }
    }

    impl ResourceBackend for FailingBackend {
        fn alloc_vertex_buffer(&mut self, memory: &[u8], stride: u32) -> Result<Handle, BackendError> {
            if self.vertex_allocs_left == 0 {
                return Err(BackendError::Exhausted {
                    kind: ResourceKind::VertexBuffer,
                });
            }
            self.vertex_allocs_left -= 1;
            self.inner.alloc_vertex_buffer(memory, stride)
        }

        fn alloc_index_buffer(&mut self, memory: &[u8]) -> Result<Handle, BackendError> {
            self.inner.alloc_index_buffer(memory)
        }

        fn alloc_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> Result<Handle, BackendError> {
            self.inner.alloc_texture(width, height, pixels)
        }

        fn update(&mut self, handle: Handle, offset: u32, data: &[u8], dynamic: bool) -> Result<(), BackendError> {
            self.inner.update(handle, offset, data, dynamic)
        }

        fn destroy(&mut self, handle: Handle) -> bool {
            self.inner.destroy(handle)
        }

        fn vertex_buffer(&self, handle: Handle) -> Option<BufferInfo> {
            self.inner.vertex_buffer(handle)
        }

        fn index_buffer(&self, handle: Handle) -> Option<BufferInfo> {
            self.inner.index_buffer(handle)
        }

        fn texture(&self, handle: Handle) -> Option<TextureInfo> {
            self.inner.texture(handle)
        }
    }

    struct Quad(f32);

    impl BatchObject for Quad {
        fn fill(&self, out: &mut [PosTexColorVertex]) {
            for v in out {
                v.x = self.0;
            }
        }
    }

    #[test]
    fn runs_become_commands() {
        let mut r = BatchRenderer::new(64);
        r.begin(Handle::from_raw(1));
        r.draw(&Quad(1.0));
        r.draw(&Quad(2.0));
        r.end();
        r.begin(Handle::from_raw(2));
        r.draw(&Quad(3.0));
        r.end();

        assert_eq!(r.flush(), 2);
        assert_eq!(
            r.last_frame(),
            &[
                BatchCommand {
                    texture: Handle::from_raw(1),
                    first_vertex: 0,
                    vertex_count: 8
                },
                BatchCommand {
                    texture: Handle::from_raw(2),
                    first_vertex: 8,
                    vertex_count: 4
                },
            ]
        );
        assert_eq!(r.last_vertices()[8].x, 3.0);
    }

    #[test]
    fn empty_frame_flushes_zero() {
        let mut r = BatchRenderer::new(64);
        assert_eq!(r.flush(), 0);
        r.begin(Handle::from_raw(1));
        r.end();
        assert_eq!(r.flush(), 0, "empty batches are not issued");
    }

    #[test]
    fn long_runs_split_at_capacity() {
        let mut r = BatchRenderer::new(8);
        r.begin(Handle::from_raw(5));
        for i in 0..5 {
            r.draw(&Quad(i as f32));
        }
        r.end();

        assert_eq!(r.flush(), 3);
        let quads: Vec<u32> = r.last_frame().iter().map(BatchCommand::quads).collect();
        assert_eq!(quads, vec![2, 2, 1]);
        assert!(r.last_frame().iter().all(|c| c.texture == Handle::from_raw(5)));
    }

    #[test]
    fn draw_outside_batch_is_dropped() {
        let mut r = BatchRenderer::new(8);
        r.draw(&Quad(0.0));
        assert_eq!(r.flush(), 0);
        assert_eq!(r.dropped(), 1, "count survives the flush that ends the frame");

        r.begin(Handle::from_raw(1));
        r.draw(&Quad(1.0));
        r.end();
        assert_eq!(r.flush(), 1);
        assert_eq!(r.dropped(), 0);
    }

    #[test]
    fn oversized_object_counts_as_dropped() {
        struct Strip;
        impl BatchObject for Strip {
            fn size(&self) -> usize {
                12
            }
            fn fill(&self, _out: &mut [PosTexColorVertex]) {}
        }

        let mut r = BatchRenderer::new(8);
        r.begin(Handle::from_raw(1));
        r.draw(&Strip);
        r.draw(&Quad(1.0));
        r.end();
        assert_eq!(r.flush(), 1);
        assert_eq!(r.dropped(), 1);
        assert_eq!(r.last_vertices().len(), 4);
    }

    #[test]
    fn quad_index_pattern() {
        assert_eq!(quad_indices(2), vec![3, 0, 1, 3, 1, 2, 7, 4, 5, 7, 5, 6]);
    }

    #[test]
    fn capacity_is_capped_at_u16_range() {
        let r = BatchRenderer::new(1 << 17);
        assert_eq!(r.capacity(), MAX_BATCH_VERTICES);

        let indices = quad_indices(r.capacity() / 4);
        assert_eq!(indices.len(), MAX_BATCH_VERTICES / 4 * 6);
        assert_eq!(&indices[indices.len() - 6..], &[65535, 65532, 65533, 65535, 65533, 65534]);
        assert_eq!(indices.iter().copied().max(), Some(u16::MAX));
    }

    #[test]
    fn full_size_index_buffer_never_wraps() {
        let mut backend = HeadlessBackend::new();
        let mut r = BatchRenderer::new(1 << 17);
        r.setup(&mut backend).unwrap();

        let indices: Vec<u16> = backend
            .buffer_bytes(r.index_buffer())
            .unwrap()
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();
        let quad = |q: usize| &indices[q * 6..q * 6 + 6];
        assert_eq!(indices.len(), MAX_BATCH_VERTICES / 4 * 6);
        assert_ne!(quad(16383), quad(0));
        assert_eq!(quad(16383)[1], 65532);
    }

    #[test]
    fn failed_setup_releases_index_buffer() {
        let mut backend = FailingBackend::new(0);
        let mut r = BatchRenderer::new(8);

        let err = r.setup(&mut backend).unwrap_err();
        assert_eq!(
            err,
            BackendError::Exhausted {
                kind: ResourceKind::VertexBuffer
            }
        );
        assert!(!r.vertex_buffer().is_valid());
        assert!(!r.index_buffer().is_valid());
        assert_eq!(backend.inner.live_resources(), 0);
    }

    #[test]
    fn failed_grow_then_setup_reuses_index_buffer() {
        let mut backend = FailingBackend::new(1);
        let mut r = BatchRenderer::new(4);
        r.setup(&mut backend).unwrap();
        let index_buffer = r.index_buffer();

        r.begin(Handle::from_raw(0));
        r.draw(&Quad(1.0));
        r.draw(&Quad(2.0));
        r.end();
        r.flush();

        assert!(r.upload(&mut backend).is_err());
        assert!(!r.vertex_buffer().is_valid());
        assert_eq!(r.index_buffer(), index_buffer);
        assert_eq!(backend.inner.live_resources(), 1);

        backend.vertex_allocs_left = 1;
        r.setup(&mut backend).unwrap();
        assert_eq!(r.index_buffer(), index_buffer);
        assert_eq!(backend.inner.live_resources(), 2);

        assert_eq!(r.release(&mut backend), 2);
        assert_eq!(backend.inner.live_resources(), 0);
    }

    #[test]
    fn upload_before_setup_is_an_error() {
        let mut backend = HeadlessBackend::new();
        let mut r = BatchRenderer::new(8);
        assert_eq!(
            r.upload(&mut backend),
            Err(BackendError::UnknownHandle(Handle::INVALID))
        );
    }

    #[test]
    fn upload_grows_and_release_frees() {
        let mut backend = HeadlessBackend::new();
        let mut r = BatchRenderer::new(4);
        r.setup(&mut backend).unwrap();
        assert_eq!(backend.live_resources(), 2);

        r.begin(Handle::from_raw(0));
        r.draw(&Quad(1.0));
        r.draw(&Quad(2.0));
        r.end();
        r.flush();

        let written = r.upload(&mut backend).unwrap();
        assert_eq!(written, 8 * VERTEX_STRIDE as usize);
        let info = backend.vertex_buffer(r.vertex_buffer()).unwrap();
        assert!(info.dynamic);
        assert_eq!(info.size as usize, written);

        assert_eq!(r.release(&mut backend), 2);
        assert_eq!(r.release(&mut backend), 0);
        assert_eq!(backend.live_resources(), 0);
    }
}
