// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Recognition dispatcher tests with scripted backends
//!
//! Verifies strategy selection, output order, coordinate mapping and error
//! propagation without any model files.

use crate::common::{framed_blank_label, two_line_label, unlabeled_photo, ScriptedFull, ScriptedLine};
use fabstir_label_ocr::config::PipelineConfig;
use fabstir_label_ocr::vision::label::padded_bounds;
use fabstir_label_ocr::vision::{RecognitionDispatcher, StrategyOutcome};
use image::DynamicImage;
use serde_json::json;
use std::sync::Arc;

fn structured_page() -> serde_json::Value {
    json!({
        "dt_polys": [
            [[4, 4], [40, 4], [40, 16], [4, 16]],
            [[4, 30], [60, 30], [60, 44], [4, 44]]
        ],
        "rec_texts": ["BATCH 7", "EXP 2026-01"],
        "rec_scores": [0.97, 0.88]
    })
}

fn dispatcher(full: &Arc<ScriptedFull>, line: &Arc<ScriptedLine>) -> RecognitionDispatcher {
    RecognitionDispatcher::new(PipelineConfig::default(), full.clone(), line.clone())
}

#[tokio::test]
async fn test_segmented_label_reads_lines_in_order() {
    let full = Arc::new(ScriptedFull::answering(vec![structured_page()]));
    let line = Arc::new(ScriptedLine::answering(vec!["LOT 0042", "BEST BEFORE 2026"]));

    let photo = DynamicImage::ImageRgb8(two_line_label());
    let result = dispatcher(&full, &line).dispatch(&photo).await.unwrap();

    assert_eq!(result.outcome, StrategyOutcome::LabelDetectedAndSegmented);
    assert!(full.call_sizes().is_empty());

    let texts: Vec<&str> = result.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["LOT 0042", "BEST BEFORE 2026"]);
    assert!(result.items.iter().all(|i| i.polygon.is_empty()));

    // Each line crop is short and wide
    for (width, height) in line.call_sizes() {
        assert!(width > height);
    }
}

#[tokio::test]
async fn test_label_without_lines_falls_back_to_label_crop() {
    let full = Arc::new(ScriptedFull::answering(vec![structured_page()]));
    let line = Arc::new(ScriptedLine::answering(vec![]));

    let photo = DynamicImage::ImageRgb8(framed_blank_label());
    let result = dispatcher(&full, &line).dispatch(&photo).await.unwrap();

    assert_eq!(result.outcome, StrategyOutcome::LabelDetectedNoLines);
    assert!(line.call_sizes().is_empty());

    let label = result.profile.label_box.unwrap();
    let crop = padded_bounds(400, 200, &label, 0.02).unwrap();
    assert_eq!(full.call_sizes(), vec![(crop.width, crop.height)]);

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].text, "BATCH 7");
    assert_eq!(
        result.items[0].polygon[0],
        [4.0 + crop.x as f32, 4.0 + crop.y as f32]
    );
}

#[tokio::test]
async fn test_no_label_reads_whole_photo() {
    let full = Arc::new(ScriptedFull::answering(vec![structured_page()]));
    let line = Arc::new(ScriptedLine::answering(vec![]));

    let photo = DynamicImage::ImageRgb8(unlabeled_photo());
    let result = dispatcher(&full, &line).dispatch(&photo).await.unwrap();

    assert_eq!(result.outcome, StrategyOutcome::NoLabelFound);
    assert_eq!(full.call_sizes(), vec![(400, 200)]);
    assert_eq!(result.items[1].text, "EXP 2026-01");
    assert_eq!(result.items[1].polygon[2], [60.0, 44.0]);
    assert_eq!(result.profile.line_count, 0);
}

#[tokio::test]
async fn test_legacy_pages_are_accepted() {
    let legacy = json!([
        [[[0, 0], [10, 0], [10, 5], [0, 5]], ["OLD SHAPE", 0.7]],
        [[[0, 0]]],
        [[[0, 9], [10, 9], [10, 14], [0, 14]], ["SECOND", "0.65"]]
    ]);
    let full = Arc::new(ScriptedFull::answering(vec![legacy]));
    let line = Arc::new(ScriptedLine::answering(vec![]));

    let photo = DynamicImage::ImageRgb8(unlabeled_photo());
    let result = dispatcher(&full, &line).dispatch(&photo).await.unwrap();

    let texts: Vec<&str> = result.items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["OLD SHAPE", "SECOND"]);
    assert!((result.items[1].confidence - 0.65).abs() < 1e-6);
}

#[tokio::test]
async fn test_backend_failure_is_not_a_fallback() {
    let full = Arc::new(ScriptedFull::failing("onnx session lost"));
    let line = Arc::new(ScriptedLine::answering(vec![]));

    let photo = DynamicImage::ImageRgb8(unlabeled_photo());
    let err = dispatcher(&full, &line).dispatch(&photo).await.unwrap_err();

    assert_eq!(err.strategy(), Some(StrategyOutcome::NoLabelFound));
    assert!(err.to_string().contains("onnx session lost"));
    assert_eq!(full.call_sizes().len(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_share_backends() {
    let full = Arc::new(ScriptedFull::answering(vec![structured_page()]));
    let line = Arc::new(ScriptedLine::answering(vec![]));
    let dispatcher = Arc::new(dispatcher(&full, &line));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            let photo = DynamicImage::ImageRgb8(unlabeled_photo());
            dispatcher.dispatch(&photo).await.map(|r| r.items.len())
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }
    assert_eq!(full.call_sizes().len(), 4);
}
