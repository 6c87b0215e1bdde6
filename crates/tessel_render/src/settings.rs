//! Render settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest per-draw vertex count reachable with `u16` indices.
pub const MAX_BATCH_VERTICES: usize = 1 << 16;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables of the sprite pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Rows added whenever a component table fills up.
    pub table_growth_step: usize,
    /// Vertices one batch command may hold.
    pub max_batch_vertices: usize,
    /// Frames of batch-count history kept for statistics.
    pub stats_history: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            table_growth_step: 64,
            max_batch_vertices: 4096,
            stats_history: 120,
        }
    }
}

impl RenderSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), ?settings, "render settings loaded");
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.table_growth_step == 0 {
            return Err(SettingsError::Invalid {
                field: "table_growth_step",
                reason: "must be greater than zero".into(),
            });
        }
        let v = self.max_batch_vertices;
        if v == 0 || v % 4 != 0 || v > MAX_BATCH_VERTICES {
            return Err(SettingsError::Invalid {
                field: "max_batch_vertices",
                reason: format!("{v} is not a non-zero multiple of 4 up to {MAX_BATCH_VERTICES}"),
            });
        }
        Ok(())
    }
}
