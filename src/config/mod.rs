// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every tunable of the label pipeline is a named field with a default equal to
//! the fixed constant the pipeline was tuned with. A TOML file may override any
//! subset of them; CLI flags and `LABEL_OCR_*` environment variables override the
//! server and backend sections on top of that (see `main.rs`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub recognition: RecognitionConfig,
}

impl AppConfig {
    /// Check every section for values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        self.pipeline.validate()
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Which recognition collaborator implementation to load at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionBackend {
    /// In-process PaddleOCR ONNX models
    #[default]
    Onnx,
    /// External PaddleOCR process reached over HTTP
    Sidecar,
}

impl std::fmt::Display for RecognitionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionBackend::Onnx => write!(f, "onnx"),
            RecognitionBackend::Sidecar => write!(f, "sidecar"),
        }
    }
}

/// Recognition collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub backend: RecognitionBackend,
    /// Directory holding det_model.onnx, rec_model.onnx and ppocr_keys_v1.txt
    pub model_dir: String,
    /// Base URL of the PaddleOCR sidecar
    pub sidecar_url: String,
    /// Sidecar request timeout in seconds
    pub sidecar_timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend: RecognitionBackend::Onnx,
            model_dir: "./models/paddleocr-onnx".to_string(),
            sidecar_url: "http://127.0.0.1:8868".to_string(),
            sidecar_timeout_secs: 60,
        }
    }
}

/// Parameters of the label localization and line segmentation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Longest side an image may have before it is handed to the full recognizer
    pub max_image_side: u32,
    pub region: RegionConfig,
    pub extract: ExtractConfig,
    pub segment: SegmentConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_image_side: 1920,
            region: RegionConfig::default(),
            extract: ExtractConfig::default(),
            segment: SegmentConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_image_side == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_image_side must be greater than 0".to_string(),
            ));
        }
        self.region.validate()?;
        self.extract.validate()?;
        self.segment.validate()
    }
}

/// Inclusive hue interval on the 8-bit 0..=180 hue axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueBand {
    pub min: u8,
    pub max: u8,
}

impl HueBand {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, hue: u8) -> bool {
        hue >= self.min && hue <= self.max
    }
}

/// Color-based label detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Two hue intervals on either side of the cyclic hue origin
    pub hue_bands: [HueBand; 2],
    /// Inclusive saturation band
    pub saturation: [u8; 2],
    /// Inclusive value band
    pub value: [u8; 2],
    /// Side length of the square structuring element (odd)
    pub morph_kernel_size: u8,
    /// Smallest contour area accepted, as a fraction of the image area
    pub min_area_fraction: f64,
    /// Smallest contour area / bounding rectangle area accepted
    pub min_solidity: f64,
    /// Accepted width / height range
    pub aspect_ratio: [f64; 2],
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            hue_bands: [HueBand::new(0, 10), HueBand::new(150, 180)],
            saturation: [60, 255],
            value: [70, 255],
            morph_kernel_size: 5,
            min_area_fraction: 0.01,
            min_solidity: 0.6,
            aspect_ratio: [0.8, 8.0],
        }
    }
}

impl RegionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for band in &self.hue_bands {
            if band.min > band.max || band.max > 180 {
                return Err(ConfigError::Invalid(format!(
                    "hue band {}..={} must be ordered and within 0..=180",
                    band.min, band.max
                )));
            }
        }
        if self.saturation[0] > self.saturation[1] || self.value[0] > self.value[1] {
            return Err(ConfigError::Invalid(
                "saturation and value bands must be ordered [min, max]".to_string(),
            ));
        }
        if self.morph_kernel_size == 0 || self.morph_kernel_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "morph_kernel_size must be odd, got {}",
                self.morph_kernel_size
            )));
        }
        if !(0.0..1.0).contains(&self.min_area_fraction) {
            return Err(ConfigError::Invalid(
                "min_area_fraction must be in [0, 1)".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_solidity) {
            return Err(ConfigError::Invalid(
                "min_solidity must be in [0, 1]".to_string(),
            ));
        }
        if self.aspect_ratio[0] <= 0.0 || self.aspect_ratio[0] > self.aspect_ratio[1] {
            return Err(ConfigError::Invalid(
                "aspect_ratio must be a positive [min, max] range".to_string(),
            ));
        }
        Ok(())
    }
}

/// Label crop padding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Padding fraction when the crop feeds the line segmenter
    pub label_padding_fraction: f64,
    /// Padding fraction when the crop goes straight to whole-label recognition
    pub fallback_padding_fraction: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            label_padding_fraction: 0.05,
            fallback_padding_fraction: 0.02,
        }
    }
}

impl ExtractConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.label_padding_fraction < 0.0 || self.fallback_padding_fraction < 0.0 {
            return Err(ConfigError::Invalid(
                "padding fractions must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Projection-based line segmentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// A row is text when its ink count exceeds this fraction of the width
    pub min_row_ink_fraction: f64,
    /// Bands shorter than this many rows are dropped
    pub min_band_height: u32,
    /// Vertical padding as a fraction of band height
    pub band_padding_fraction: f64,
    /// Minimum vertical padding in pixels
    pub band_padding_floor: u32,
    /// A column is inked when its count within the band exceeds this
    pub min_column_ink: u32,
    /// Pixels added left and right of the inked columns
    pub horizontal_margin: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_row_ink_fraction: 0.02,
            min_band_height: 8,
            band_padding_fraction: 0.15,
            band_padding_floor: 3,
            min_column_ink: 1,
            horizontal_margin: 6,
        }
    }
}

impl SegmentConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.min_row_ink_fraction) {
            return Err(ConfigError::Invalid(
                "min_row_ink_fraction must be in [0, 1)".to_string(),
            ));
        }
        if self.band_padding_fraction < 0.0 {
            return Err(ConfigError::Invalid(
                "band_padding_fraction must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file and validate it
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
