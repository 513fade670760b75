// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Label OCR pipeline
//!
//! This module provides:
//! - Pink label localization by HSV masking and contour filtering
//! - Label cropping and projection-based line segmentation
//! - Recognition strategy selection over pluggable PaddleOCR backends
//!
//! Everything runs on CPU.

pub mod color;
pub mod dispatcher;
pub mod image_utils;
pub mod label;
pub mod model_manager;
pub mod ocr;

pub use dispatcher::{
    DispatchError, DispatchProfile, DispatchResult, RecognitionDispatcher, StageTimings,
    StrategyOutcome,
};
pub use image_utils::{cap_longest_side, decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use label::{BoundingBox, LineSegmenter, RegionDetector};
pub use model_manager::{BackendInfo, RecognitionBackends, RecognitionModelManager};
