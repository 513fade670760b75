// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process PaddleOCR pipeline over ONNX Runtime
//!
//! Detection and recognition run on CPU. Inference is blocking, so trait calls
//! move it onto the blocking thread pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::detection::TextDetector;
use super::engine::{FullTextRecognizer, LineTextRecognizer};
use super::page::{LinePage, Polygon, RecognitionPage, StructuredPage};
use super::recognition::TextRecognizer;

pub const DETECTION_MODEL_FILE: &str = "det_model.onnx";
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";
pub const DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// PaddleOCR detection + recognition models
///
/// Cloning is cheap; sessions are shared behind `Arc<Mutex<_>>`.
#[derive(Debug, Clone)]
pub struct PaddleOcrModel {
    detector: TextDetector,
    recognizer: TextRecognizer,
}

impl PaddleOcrModel {
    /// Load models from a directory holding the three PaddleOCR files
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let detector = TextDetector::new(model_dir.join(DETECTION_MODEL_FILE))?;
        let recognizer = TextRecognizer::new(
            model_dir.join(RECOGNITION_MODEL_FILE),
            model_dir.join(DICTIONARY_FILE),
        )?;
        Ok(Self {
            detector,
            recognizer,
        })
    }

    /// Detect text boxes then recognize each crop, as one structured page
    pub fn run_full(&self, image: &DynamicImage) -> Result<StructuredPage> {
        let start = Instant::now();
        let boxes = self.detector.detect(image)?;

        let mut polygons: Vec<Polygon> = Vec::with_capacity(boxes.len());
        let mut texts = Vec::with_capacity(boxes.len());
        let mut scores = Vec::with_capacity(boxes.len());

        for text_box in &boxes {
            let x = text_box.x.floor().max(0.0) as u32;
            let y = text_box.y.floor().max(0.0) as u32;
            let width = (text_box.width.ceil() as u32).min(image.width().saturating_sub(x));
            let height = (text_box.height.ceil() as u32).min(image.height().saturating_sub(y));
            if width == 0 || height == 0 {
                continue;
            }

            let crop = image.crop_imm(x, y, width, height);
            let recognized = self.recognizer.recognize(&crop)?;
            if recognized.is_empty() {
                continue;
            }
            polygons.push(text_box.polygon());
            texts.push(recognized.text);
            scores.push(recognized.confidence);
        }

        debug!(
            "PaddleOCR full pass: {} boxes, {} texts in {} ms",
            boxes.len(),
            texts.len(),
            start.elapsed().as_millis()
        );
        Ok(StructuredPage::from_parts(polygons, texts, scores))
    }

    /// Recognize a single pre-cropped line
    pub fn run_line(&self, line: &DynamicImage) -> Result<LinePage> {
        let recognized = self.recognizer.recognize(line)?;
        Ok(LinePage::new(recognized.text, recognized.confidence))
    }
}

#[async_trait]
impl FullTextRecognizer for PaddleOcrModel {
    fn name(&self) -> &'static str {
        "paddleocr-onnx"
    }

    async fn predict(&self, image: &DynamicImage) -> Result<Vec<RecognitionPage>> {
        let model = self.clone();
        let image = image.clone();
        let page = tokio::task::spawn_blocking(move || model.run_full(&image))
            .await
            .context("OCR detection task panicked")??;
        Ok(vec![RecognitionPage::Structured(page)])
    }
}

#[async_trait]
impl LineTextRecognizer for PaddleOcrModel {
    fn name(&self) -> &'static str {
        "paddleocr-onnx"
    }

    async fn predict(&self, line: &DynamicImage) -> Result<Vec<LinePage>> {
        let model = self.clone();
        let line = line.clone();
        let page = tokio::task::spawn_blocking(move || model.run_line(&line))
            .await
            .context("OCR recognition task panicked")??;
        Ok(vec![page])
    }
}
