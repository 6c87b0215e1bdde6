//! Tessel Core
//!
//! Contains the fundamental building blocks shared by the render layer:
//! - Entity identity and registry
//! - Dense component tables
//! - World transforms
//! - Affine math helpers

pub mod ecs;
pub mod math;
pub mod transform;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
