//! Render configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. Command-line flags override values read from the file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::ExportFormat;
use crate::error::{Result, StemweaveError};

/// Smallest pitch-shifter grain, in samples
pub const MIN_PITCH_WINDOW: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Samples rotated by `early` / `late`
    pub time_shift_samples: usize,
    /// Grain size of the pitch shifter, in samples
    pub pitch_window: usize,
    /// Scale the whole mix down when its peak exceeds `normalize_ceiling`
    pub normalize: bool,
    pub normalize_ceiling: f32,
    /// Output bit depth: 16, 24 or 32
    pub bit_depth: u16,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            time_shift_samples: 1500,
            pitch_window: 2048,
            normalize: false,
            normalize_ceiling: 1.0,
            bit_depth: 24,
        }
    }
}

impl RenderConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StemweaveError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }

        let text = fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if isize::try_from(self.time_shift_samples).is_err() {
            return Err(StemweaveError::Config {
                reason: format!(
                    "time_shift_samples must be at most {}, got {}",
                    isize::MAX,
                    self.time_shift_samples
                ),
            });
        }
        if self.pitch_window < MIN_PITCH_WINDOW {
            return Err(StemweaveError::Config {
                reason: format!(
                    "pitch_window must be at least {} samples, got {}",
                    MIN_PITCH_WINDOW, self.pitch_window
                ),
            });
        }
        if !(self.normalize_ceiling > 0.0 && self.normalize_ceiling <= 1.0) {
            return Err(StemweaveError::Config {
                reason: format!(
                    "normalize_ceiling must be in (0, 1], got {}",
                    self.normalize_ceiling
                ),
            });
        }
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(StemweaveError::Config {
                reason: format!("bit_depth must be 16, 24 or 32, got {}", self.bit_depth),
            });
        }
        Ok(())
    }

    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::new(self.bit_depth)
    }
}
