use std::path::PathBuf;
use tessel_render::BackendError;
use thiserror::Error;

use crate::descriptor::PixelRect;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("malformed atlas descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),

    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("region `{name}` {rect:?} does not fit a {width}x{height} texture")]
    InvalidRegion {
        name: String,
        rect: PixelRect,
        width: u32,
        height: u32,
    },

    #[error("texture `{0}` is not loaded")]
    UnknownTexture(String),
}

pub type Result<T> = std::result::Result<T, AssetError>;
