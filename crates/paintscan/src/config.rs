//! JSON configuration for scanning sessions and the CLI.

use crate::capture::{CaptureParams, DEFAULT_OUTPUT_SIZE};
use crate::core::{AxisMapping, Interpolation};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Encoding used for saved captures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

fn default_output_size() -> usize {
    DEFAULT_OUTPUT_SIZE
}

fn default_axis_mapping() -> AxisMapping {
    AxisMapping::PORTRAIT_SENSOR
}

/// Session configuration. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_output_size")]
    pub output_size: usize,
    #[serde(default)]
    pub interpolation: Interpolation,
    /// RGBA fill for output pixels outside the photo.
    #[serde(default)]
    pub background: [u8; 4],
    #[serde(default = "default_axis_mapping")]
    pub axis_mapping: AxisMapping,
    /// Where captures are written; `None` disables persistence.
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
    /// Also write the raw image with the projected corners drawn on it.
    #[serde(default)]
    pub save_marked: bool,
    #[serde(default)]
    pub image_format: OutputFormat,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            output_size: default_output_size(),
            interpolation: Interpolation::default(),
            background: [0; 4],
            axis_mapping: default_axis_mapping(),
            save_dir: None,
            save_marked: false,
            image_format: OutputFormat::default(),
        }
    }
}

impl ScanConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn capture_params(&self) -> CaptureParams {
        CaptureParams {
            output_size: self.output_size,
            interpolation: self.interpolation,
            background: self.background,
            axis_mapping: self.axis_mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg: ScanConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, ScanConfig::default());
        assert_eq!(cfg.capture_params(), CaptureParams::default());
    }

    #[test]
    fn partial_config_overrides_named_fields() {
        let cfg: ScanConfig = serde_json::from_str(
            r#"{
                "output_size": 512,
                "interpolation": "nearest",
                "axis_mapping": { "flip_x": true },
                "image_format": "jpeg"
            }"#,
        )
        .expect("parse");
        assert_eq!(cfg.output_size, 512);
        assert_eq!(cfg.interpolation, Interpolation::Nearest);
        assert_eq!(cfg.axis_mapping, AxisMapping::new(false, true, false));
        assert_eq!(cfg.image_format.extension(), "jpg");
        assert!(cfg.save_dir.is_none());
    }

    #[test]
    fn unknown_interpolation_is_rejected() {
        let err = serde_json::from_str::<ScanConfig>(r#"{"interpolation":"cubic"}"#);
        assert!(err.is_err());
    }
}
