//! Atlas descriptor files
//!
//! A descriptor is a JSON object mapping region name to its pixel
//! rectangle:
//!
//! ```json
//! { "idle": { "x": 0, "y": 0, "w": 16, "h": 16 },
//!   "run":  { "x": 16, "y": 0, "w": 16, "h": 16 } }
//! ```

use crate::error::{AssetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tessel_render::{Atlas, Texture};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    fn fits(&self, width: u32, height: u32) -> bool {
        self.w > 0
            && self.h > 0
            && self.x.checked_add(self.w).is_some_and(|r| r <= width)
            && self.y.checked_add(self.h).is_some_and(|b| b <= height)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtlasDescriptor {
    pub regions: BTreeMap<String, PixelRect>,
}

impl AtlasDescriptor {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Fail on the first region that falls outside a `width × height` texture.
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        match self.regions.iter().find(|(_, rect)| !rect.fits(width, height)) {
            Some((name, rect)) => Err(AssetError::InvalidRegion {
                name: name.clone(),
                rect: *rect,
                width,
                height,
            }),
            None => Ok(()),
        }
    }

    /// Items are added in name order, so indices are stable for a given file.
    pub fn build(&self, name: &str, texture: Texture) -> Atlas {
        let mut atlas = Atlas::new(name, texture, self.regions.len());
        for (item, r) in &self.regions {
            atlas.add_item(r.x as f32, r.y as f32, r.w as f32, r.h as f32, item);
        }
        atlas
    }
}
