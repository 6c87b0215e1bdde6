//! Entity and component storage.
//!
//! Entities are plain generational handles issued by [`EntityRegistry`].
//! Per-entity data lives in [`ComponentTable`]s: one dense, packed array
//! per component kind plus a side map from entity index to slot.

mod entity;
mod registry;
mod table;

pub use entity::Entity;
pub use registry::EntityRegistry;
pub use table::{ComponentTable, TableError, TableRow, DEFAULT_GROWTH_STEP};
