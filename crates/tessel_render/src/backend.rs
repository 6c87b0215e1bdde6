//! Graphics resource backend abstraction
//!
//! The render layer never owns GPU objects directly. It asks a
//! [`ResourceBackend`] for buffers and textures and keeps the returned
//! [`Handle`]s. [`HeadlessBackend`] keeps everything in CPU memory and is
//! used by tests and the runtime demo.

use thiserror::Error;

/// Opaque id of a backend resource.
///
/// `0xFFFF` is reserved as [`Handle::INVALID`]; every other value may be
/// live. Texture handles double as sprite batch keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u16);

impl Handle {
    pub const INVALID: Handle = Handle(u16::MAX);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    VertexBuffer,
    IndexBuffer,
    Texture,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("no free resource slots left for a {kind:?}")]
    Exhausted { kind: ResourceKind },

    #[error("refusing to allocate an empty {kind:?}")]
    Empty { kind: ResourceKind },

    #[error("handle {0:?} does not refer to a live resource")]
    UnknownHandle(Handle),

    #[error("handle {handle:?} is a {found:?}, not a buffer")]
    NotABuffer { handle: Handle, found: ResourceKind },

    #[error("write of {len} bytes at offset {offset} exceeds buffer size {size}")]
    OutOfRange { offset: u32, len: usize, size: u32 },

    #[error("texture of {width}x{height} needs {expected} bytes of RGBA8, got {actual}")]
    PixelSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Layout of a live vertex or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    pub size: u32,
    pub stride: u32,
    /// Set once the buffer has received a dynamic update.
    pub dynamic: bool,
}

/// Dimensions of a live texture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
}

/// Resource allocation interface consumed by meshes, the batch renderer
/// and the texture manager.
///
/// All calls are synchronous. `destroy` must accept any handle, including
/// [`Handle::INVALID`] and already-destroyed ones, and report whether a
/// resource was actually released.
pub trait ResourceBackend {
    fn alloc_vertex_buffer(&mut self, memory: &[u8], stride: u32) -> Result<Handle, BackendError>;

    /// Index buffers hold `u16` indices.
    fn alloc_index_buffer(&mut self, memory: &[u8]) -> Result<Handle, BackendError>;

    /// `pixels` is tightly packed RGBA8.
    fn alloc_texture(&mut self, width: u32, height: u32, pixels: &[u8])
        -> Result<Handle, BackendError>;

    fn update(
        &mut self,
        handle: Handle,
        offset: u32,
        data: &[u8],
        dynamic: bool,
    ) -> Result<(), BackendError>;

    fn destroy(&mut self, handle: Handle) -> bool;

    fn vertex_buffer(&self, handle: Handle) -> Option<BufferInfo>;

    fn index_buffer(&self, handle: Handle) -> Option<BufferInfo>;

    fn texture(&self, handle: Handle) -> Option<TextureInfo>;
}

/// Call counts kept by [`HeadlessBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub allocations: usize,
    pub updates: usize,
    pub destroys: usize,
}

enum Resource {
    Buffer {
        kind: ResourceKind,
        stride: u32,
        dynamic: bool,
        bytes: Vec<u8>,
    },
    Texture(TextureInfo),
}

impl Resource {
    fn kind(&self) -> ResourceKind {
        match self {
            Resource::Buffer { kind, .. } => *kind,
            Resource::Texture(_) => ResourceKind::Texture,
        }
    }
}

/// In-memory backend. Buffers keep their bytes so callers can inspect
/// exactly what was uploaded.
pub struct HeadlessBackend {
    slots: Vec<Option<Resource>>,
    free: Vec<u16>,
    live: usize,
    limit: usize,
    stats: BackendStats,
}

impl HeadlessBackend {
    /// Largest number of simultaneously live resources a `u16` handle space allows.
    pub const MAX_RESOURCES: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self::with_limit(Self::MAX_RESOURCES)
    }

    /// Backend that fails allocations once `limit` resources are live.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            limit: limit.min(Self::MAX_RESOURCES),
            stats: BackendStats::default(),
        }
    }

    pub fn live_resources(&self) -> usize {
        self.live
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    /// Current contents of a vertex or index buffer.
    pub fn buffer_bytes(&self, handle: Handle) -> Option<&[u8]> {
        match self.get(handle)? {
            Resource::Buffer { bytes, .. } => Some(bytes),
            Resource::Texture(_) => None,
        }
    }

    fn get(&self, handle: Handle) -> Option<&Resource> {
        self.slots.get(handle.raw() as usize)?.as_ref()
    }

    fn insert(&mut self, resource: Resource) -> Result<Handle, BackendError> {
        if self.live >= self.limit {
            let kind = resource.kind();
            tracing::warn!(?kind, live = self.live, "headless backend exhausted");
            return Err(BackendError::Exhausted { kind });
        }

        let raw = match self.free.pop() {
            Some(raw) => {
                self.slots[raw as usize] = Some(resource);
                raw
            }
            None => {
                let raw = self.slots.len() as u16;
                self.slots.push(Some(resource));
                raw
            }
        };
        self.live += 1;
        self.stats.allocations += 1;
        Ok(Handle::from_raw(raw))
    }

    fn alloc_buffer(
        &mut self,
        kind: ResourceKind,
        memory: &[u8],
        stride: u32,
    ) -> Result<Handle, BackendError> {
        if memory.is_empty() {
            return Err(BackendError::Empty { kind });
        }
        self.insert(Resource::Buffer {
            kind,
            stride,
            dynamic: false,
            bytes: memory.to_vec(),
        })
    }

    fn buffer_info(&self, handle: Handle, want: ResourceKind) -> Option<BufferInfo> {
        match self.get(handle)? {
            Resource::Buffer {
                kind,
                stride,
                dynamic,
                bytes,
            } if *kind == want => Some(BufferInfo {
                size: bytes.len() as u32,
                stride: *stride,
                dynamic: *dynamic,
            }),
            _ => None,
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceBackend for HeadlessBackend {
    fn alloc_vertex_buffer(&mut self, memory: &[u8], stride: u32) -> Result<Handle, BackendError> {
        self.alloc_buffer(ResourceKind::VertexBuffer, memory, stride)
    }

    fn alloc_index_buffer(&mut self, memory: &[u8]) -> Result<Handle, BackendError> {
        self.alloc_buffer(ResourceKind::IndexBuffer, memory, 2)
    }

    fn alloc_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Handle, BackendError> {
        let expected = width as usize * height as usize * 4;
        if expected == 0 {
            return Err(BackendError::Empty {
                kind: ResourceKind::Texture,
            });
        }
        if pixels.len() != expected {
            return Err(BackendError::PixelSize {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        self.insert(Resource::Texture(TextureInfo { width, height }))
    }

    fn update(
        &mut self,
        handle: Handle,
        offset: u32,
        data: &[u8],
        dynamic: bool,
    ) -> Result<(), BackendError> {
        let slot = self
            .slots
            .get_mut(handle.raw() as usize)
            .and_then(Option::as_mut)
            .ok_or(BackendError::UnknownHandle(handle))?;

        let Resource::Buffer {
            bytes,
            dynamic: is_dynamic,
            ..
        } = slot
        else {
            return Err(BackendError::NotABuffer {
                handle,
                found: ResourceKind::Texture,
            });
        };

        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(BackendError::OutOfRange {
                offset,
                len: data.len(),
                size: bytes.len() as u32,
            });
        }
        bytes[start..end].copy_from_slice(data);
        *is_dynamic |= dynamic;
        self.stats.updates += 1;
        Ok(())
    }

    fn destroy(&mut self, handle: Handle) -> bool {
        if !handle.is_valid() {
            return false;
        }
        let Some(slot) = self.slots.get_mut(handle.raw() as usize) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }
        self.free.push(handle.raw());
        self.live -= 1;
        self.stats.destroys += 1;
        true
    }

    fn vertex_buffer(&self, handle: Handle) -> Option<BufferInfo> {
        self.buffer_info(handle, ResourceKind::VertexBuffer)
    }

    fn index_buffer(&self, handle: Handle) -> Option<BufferInfo> {
        self.buffer_info(handle, ResourceKind::IndexBuffer)
    }

    fn texture(&self, handle: Handle) -> Option<TextureInfo> {
        match self.get(handle)? {
            Resource::Texture(info) => Some(*info),
            Resource::Buffer { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_is_never_issued_and_destroy_tolerates_it() {
        let mut backend = HeadlessBackend::new();
        let h = backend.alloc_vertex_buffer(&[0; 20], 20).unwrap();
        assert!(h.is_valid());
        assert!(!backend.destroy(Handle::INVALID));
        assert!(backend.destroy(h));
        assert!(!backend.destroy(h), "second destroy is a no-op");
        assert_eq!(backend.stats().destroys, 1);
    }

    #[test]
    fn allocation_fails_past_limit() {
        let mut backend = HeadlessBackend::with_limit(1);
        backend.alloc_index_buffer(&[0; 12]).unwrap();
        assert_eq!(
            backend.alloc_index_buffer(&[0; 12]),
            Err(BackendError::Exhausted {
                kind: ResourceKind::IndexBuffer
            })
        );
    }

    #[test]
    fn update_writes_in_place_and_checks_bounds() {
        let mut backend = HeadlessBackend::new();
        let h = backend.alloc_vertex_buffer(&[0; 8], 4).unwrap();

        backend.update(h, 4, &[1, 2, 3, 4], true).unwrap();
        assert_eq!(backend.buffer_bytes(h), Some(&[0, 0, 0, 0, 1, 2, 3, 4][..]));
        assert_eq!(backend.vertex_buffer(h).map(|b| b.dynamic), Some(true));

        assert!(matches!(
            backend.update(h, 6, &[9, 9, 9], false),
            Err(BackendError::OutOfRange { .. })
        ));
    }

    #[test]
    fn lookups_respect_resource_kind() {
        let mut backend = HeadlessBackend::new();
        let tex = backend.alloc_texture(2, 2, &[255; 16]).unwrap();
        assert_eq!(backend.texture(tex), Some(TextureInfo { width: 2, height: 2 }));
        assert_eq!(backend.vertex_buffer(tex), None);
        assert!(matches!(
            backend.update(tex, 0, &[0], false),
            Err(BackendError::NotABuffer { .. })
        ));
    }
}
