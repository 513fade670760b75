// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir Label OCR service

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-label-ocr-2025-11-03";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "pink-label-detection",
    "line-segmentation",
    "whole-label-fallback",
    "full-image-fallback",
    "onnx-backend",
    "sidecar-backend",
    "request-profiling",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Label OCR {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
