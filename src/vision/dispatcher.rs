// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition strategy selection
//!
//! Runs label detection, extraction and line segmentation in order, then picks
//! one of three recognition strategies:
//! - label found and segmented: each line goes to the line recognizer, in order
//! - label found, no lines: the label crop goes to the full recognizer
//! - no label: the whole photo goes to the full recognizer
//!
//! The classical stages run on the blocking pool so large photos do not stall
//! the async workers. Collaborator failures propagate; they are never
//! reinterpreted as a "nothing found" branch.

use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::vision::image_utils::cap_longest_side;
use crate::vision::label::{
    extract_region, BoundingBox, LineCrop, LineSegmenter, RegionDetector,
};
use crate::vision::ocr::{
    normalize_line_pages, normalize_pages, FullTextRecognizer, LineTextRecognizer,
    RecognitionItem,
};

/// Which recognition path produced the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyOutcome {
    LabelDetectedAndSegmented,
    LabelDetectedNoLines,
    NoLabelFound,
}

impl StrategyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyOutcome::LabelDetectedAndSegmented => "label-detected-and-segmented",
            StrategyOutcome::LabelDetectedNoLines => "label-detected-no-lines",
            StrategyOutcome::NoLabelFound => "no-label-found",
        }
    }
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Recognition failed ({strategy}): {source}")]
    Recognition {
        strategy: StrategyOutcome,
        source: anyhow::Error,
    },

    #[error("Label pipeline task failed: {0}")]
    Pipeline(#[from] tokio::task::JoinError),
}

impl DispatchError {
    /// Strategy that was running, `None` when the failure came before strategy selection
    pub fn strategy(&self) -> Option<StrategyOutcome> {
        match self {
            DispatchError::Recognition { strategy, .. } => Some(*strategy),
            DispatchError::Pipeline(_) => None,
        }
    }
}

/// Stage timings in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub detect: f64,
    pub segment: f64,
    pub recognize: f64,
    pub total: f64,
}

/// Per-request observability record
#[derive(Debug, Clone, Serialize)]
pub struct DispatchProfile {
    pub strategy: StrategyOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_box: Option<BoundingBox>,
    pub line_count: usize,
    pub image_width: u32,
    pub image_height: u32,
    pub timings_ms: StageTimings,
}

#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// Items in detection or segmentation order
    pub items: Vec<RecognitionItem>,
    pub outcome: StrategyOutcome,
    pub profile: DispatchProfile,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Output of the classical stages, computed off the async executor
struct LabelScan {
    rgb: RgbImage,
    label: Option<BoundingBox>,
    lines: Vec<LineCrop>,
    detect_ms: f64,
    segment_ms: f64,
}

/// Detect, crop and segment; a detected box that clamps to nothing counts as no label
fn scan_label(
    detector: &RegionDetector,
    segmenter: &LineSegmenter,
    image: &DynamicImage,
    padding: f64,
) -> LabelScan {
    let detect_start = Instant::now();
    let rgb = image.to_rgb8();
    let label = detector
        .detect(&rgb)
        .and_then(|bbox| extract_region(&rgb, &bbox, padding).map(|crop| (bbox, crop)));
    let detect_ms = elapsed_ms(detect_start);

    let (label, lines, segment_ms) = match label {
        Some((bbox, crop)) => {
            let segment_start = Instant::now();
            let lines = segmenter.segment(&crop.image);
            (Some(bbox), lines, elapsed_ms(segment_start))
        }
        None => (None, Vec::new(), 0.0),
    };

    LabelScan {
        rgb,
        label,
        lines,
        detect_ms,
        segment_ms,
    }
}

/// Label pipeline plus injected recognition collaborators
pub struct RecognitionDispatcher {
    config: PipelineConfig,
    detector: RegionDetector,
    segmenter: LineSegmenter,
    full: Arc<dyn FullTextRecognizer>,
    line: Arc<dyn LineTextRecognizer>,
}

impl RecognitionDispatcher {
    pub fn new(
        config: PipelineConfig,
        full: Arc<dyn FullTextRecognizer>,
        line: Arc<dyn LineTextRecognizer>,
    ) -> Self {
        Self {
            detector: RegionDetector::new(config.region.clone()),
            segmenter: LineSegmenter::new(config.segment.clone()),
            config,
            full,
            line,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the full recognizer backend
    pub fn backend_name(&self) -> &'static str {
        self.full.name()
    }

    /// Run the pipeline on a decoded photo
    pub async fn dispatch(&self, image: &DynamicImage) -> Result<DispatchResult, DispatchError> {
        let start = Instant::now();
        let detector = self.detector.clone();
        let segmenter = self.segmenter.clone();
        let padding = self.config.extract.label_padding_fraction;
        let photo = image.clone();
        let scan = tokio::task::spawn_blocking(move || {
            scan_label(&detector, &segmenter, &photo, padding)
        })
        .await?;

        let mut timings = StageTimings {
            detect: scan.detect_ms,
            segment: scan.segment_ms,
            ..StageTimings::default()
        };
        let line_count = scan.lines.len();
        let label_box = scan.label;

        let recognize_start = Instant::now();
        let (items, outcome) = match label_box {
            None => {
                let outcome = StrategyOutcome::NoLabelFound;
                let items = self.recognize_full(image, (0, 0), outcome).await?;
                (items, outcome)
            }
            Some(bbox) if scan.lines.is_empty() => {
                let outcome = StrategyOutcome::LabelDetectedNoLines;
                let items = self.recognize_label(&scan.rgb, &bbox, outcome).await?;
                (items, outcome)
            }
            Some(_) => {
                let outcome = StrategyOutcome::LabelDetectedAndSegmented;
                let mut items = Vec::new();
                for line in scan.lines {
                    let line_image = DynamicImage::ImageRgb8(line.image);
                    let pages = self.line.predict(&line_image).await.map_err(|source| {
                        warn!("Line {} recognition failed: {}", line.index, source);
                        DispatchError::Recognition {
                            strategy: outcome,
                            source,
                        }
                    })?;
                    items.extend(normalize_line_pages(&pages));
                }
                (items, outcome)
            }
        };
        timings.recognize = elapsed_ms(recognize_start);

        timings.total = elapsed_ms(start);
        info!(
            "OCR strategy {}: {} items, {} lines ({:.1} ms)",
            outcome,
            items.len(),
            line_count,
            timings.total
        );

        Ok(DispatchResult {
            items,
            outcome,
            profile: DispatchProfile {
                strategy: outcome,
                label_box,
                line_count,
                image_width: image.width(),
                image_height: image.height(),
                timings_ms: timings,
            },
        })
    }

    /// Whole-label fallback: re-crop with the tighter fallback padding
    async fn recognize_label(
        &self,
        rgb: &RgbImage,
        bbox: &BoundingBox,
        outcome: StrategyOutcome,
    ) -> Result<Vec<RecognitionItem>, DispatchError> {
        match extract_region(rgb, bbox, self.config.extract.fallback_padding_fraction) {
            Some(crop) => {
                let origin = (crop.bounds.x, crop.bounds.y);
                let crop_image = DynamicImage::ImageRgb8(crop.image);
                self.recognize_full(&crop_image, origin, outcome).await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Full recognition on a capped copy, with polygons mapped back to photo pixels
    async fn recognize_full(
        &self,
        image: &DynamicImage,
        origin: (u32, u32),
        outcome: StrategyOutcome,
    ) -> Result<Vec<RecognitionItem>, DispatchError> {
        let (capped, scale) = cap_longest_side(image, self.config.max_image_side);
        debug!(
            "Full recognition on {}x{} (scale {:.3}, origin {:?})",
            capped.width(),
            capped.height(),
            scale,
            origin
        );

        let pages = self.full.predict(&capped).await.map_err(|source| {
            warn!("Full recognition failed: {}", source);
            DispatchError::Recognition {
                strategy: outcome,
                source,
            }
        })?;

        let mut items = normalize_pages(&pages);
        let inverse = 1.0 / scale;
        for item in &mut items {
            item.map_polygon(inverse, origin.0 as f32, origin.1 as f32);
        }
        Ok(items)
    }
}
