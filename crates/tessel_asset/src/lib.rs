//! Tessel Asset Pipeline
//!
//! Texture loading, atlas descriptors, and ref-counted texture management

mod descriptor;
mod error;
mod manager;

pub use descriptor::{AtlasDescriptor, PixelRect};
pub use error::{AssetError, Result};
pub use manager::TextureManager;
