//! Tessel Render
//!
//! Sprite batching on top of an opaque resource backend:
//! - [`backend`]: resource allocation interface and an in-memory backend
//! - [`mesh`]: CPU geometry mirrored into backend buffers
//! - [`sprite_table`]: per-entity sprite draw attributes
//! - [`feature`]: the sorted, batched sprite draw pass
//! - [`batch`]: the batch renderer that turns runs into draw commands

pub mod atlas;
pub mod backend;
pub mod batch;
pub mod feature;
pub mod mesh;
pub mod settings;
pub mod sprite;
pub mod sprite_table;
pub mod vertex;

pub use atlas::Atlas;
pub use backend::{BackendError, Handle, HeadlessBackend, ResourceBackend};
pub use batch::{BatchCommand, BatchObject, BatchRender, BatchRenderer};
pub use feature::{sort_key, SpriteRenderFeature};
pub use mesh::{Mesh, MeshError};
pub use settings::{RenderSettings, SettingsError};
pub use sprite::{Region, Size, Sprite, SubTexture, Texture};
pub use sprite_table::{SpriteComp, SpriteTable};
pub use vertex::{pack_rgba, PosTexColorVertex, WHITE};
