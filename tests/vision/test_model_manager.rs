// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Recognition model manager tests
//!
//! These tests verify that the RecognitionModelManager:
//! - Leaves the backend unavailable when ONNX models are missing
//! - Configures the sidecar client even if it is not reachable yet
//! - Hands out shared collaborators usable by the dispatcher
//! - Loads real models when they are present (ignored by default)

use crate::common::{two_line_label, ScriptedFull, ScriptedLine};
use fabstir_label_ocr::config::{PipelineConfig, RecognitionBackend, RecognitionConfig};
use fabstir_label_ocr::vision::{
    RecognitionBackends, RecognitionDispatcher, RecognitionModelManager, StrategyOutcome,
};
use image::DynamicImage;
use std::sync::Arc;

// Model paths (downloaded by download scripts)
const OCR_MODEL_DIR: &str = "/workspace/models/paddleocr-onnx";

#[tokio::test]
async fn test_missing_models_handled_gracefully() {
    let config = RecognitionConfig {
        backend: RecognitionBackend::Onnx,
        model_dir: "/nonexistent/path/to/ocr".to_string(),
        ..RecognitionConfig::default()
    };

    let manager = RecognitionModelManager::new(&config).await;
    assert!(!manager.has_recognizer());
    assert!(!manager.info().available);
}

#[tokio::test]
async fn test_sidecar_backend_configured() {
    let config = RecognitionConfig {
        backend: RecognitionBackend::Sidecar,
        sidecar_url: "http://127.0.0.1:59996/".to_string(),
        sidecar_timeout_secs: 1,
        ..RecognitionConfig::default()
    };

    let manager = RecognitionModelManager::new(&config).await;
    let backends = manager.backends().expect("sidecar client should be configured");
    assert_eq!(backends.full.name(), "paddleocr-sidecar");
    assert_eq!(backends.line.name(), "paddleocr-sidecar");
}

#[tokio::test]
async fn test_injected_backends_drive_dispatcher() {
    let backends = RecognitionBackends::new(
        Arc::new(ScriptedFull::answering(vec![])),
        Arc::new(ScriptedLine::answering(vec!["A", "B"])),
    );
    let manager = RecognitionModelManager::with_backends(RecognitionBackend::Onnx, backends);
    assert!(manager.has_recognizer());
    assert_eq!(manager.info().name, "scripted-full");

    let backends = manager.backends().unwrap();
    let dispatcher = RecognitionDispatcher::new(PipelineConfig::default(), backends.full, backends.line);
    let result = dispatcher
        .dispatch(&DynamicImage::ImageRgb8(two_line_label()))
        .await
        .unwrap();
    assert_eq!(result.outcome, StrategyOutcome::LabelDetectedAndSegmented);
    assert_eq!(result.items.len(), 2);
}

#[tokio::test]
#[ignore] // Only run if model files are downloaded
async fn test_onnx_models_load_and_read_label() {
    let config = RecognitionConfig {
        backend: RecognitionBackend::Onnx,
        model_dir: OCR_MODEL_DIR.to_string(),
        ..RecognitionConfig::default()
    };

    let manager = RecognitionModelManager::new(&config).await;
    assert!(manager.has_recognizer(), "models should load from {}", OCR_MODEL_DIR);
    assert_eq!(manager.info().name, "paddleocr-onnx");

    let backends = manager.backends().unwrap();
    let dispatcher = RecognitionDispatcher::new(PipelineConfig::default(), backends.full, backends.line);
    let result = dispatcher
        .dispatch(&DynamicImage::ImageRgb8(two_line_label()))
        .await
        .unwrap();
    assert_eq!(result.outcome, StrategyOutcome::LabelDetectedAndSegmented);
}
