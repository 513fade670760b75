// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR response types

use serde::{Deserialize, Serialize};

use crate::vision::label::BoundingBox;
use crate::vision::ocr::RecognitionItem;
use crate::vision::{DispatchResult, StrategyOutcome};

/// Stage timings in milliseconds, decode included
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrTimings {
    pub decode: f64,
    pub detect: f64,
    pub segment: f64,
    pub recognize: f64,
    pub total: f64,
}

/// How the request was processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrProfiling {
    /// Strategy outcome, e.g. "label-detected-and-segmented"
    pub strategy: String,
    /// Detected label rectangle in photo pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_box: Option<BoundingBox>,
    pub line_count: usize,
    pub image_width: u32,
    pub image_height: u32,
    pub timings_ms: OcrTimings,
}

/// Response from POST /ocr
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub results: Vec<RecognitionItem>,
    pub profiling: OcrProfiling,
}

impl OcrResponse {
    /// Build the response from a dispatch result plus the handler's own timings
    pub fn from_dispatch(result: DispatchResult, decode_ms: f64, total_ms: f64) -> Self {
        let profile = result.profile;
        Self {
            results: result.items,
            profiling: OcrProfiling {
                strategy: profile.strategy.to_string(),
                label_box: profile.label_box,
                line_count: profile.line_count,
                image_width: profile.image_width,
                image_height: profile.image_height,
                timings_ms: OcrTimings {
                    decode: decode_ms,
                    detect: profile.timings_ms.detect,
                    segment: profile.timings_ms.segment,
                    recognize: profile.timings_ms.recognize,
                    total: total_ms,
                },
            },
        }
    }

    pub fn strategy(&self) -> &str {
        &self.profiling.strategy
    }

    pub fn is_segmented(&self) -> bool {
        self.profiling.strategy == StrategyOutcome::LabelDetectedAndSegmented.as_str()
    }
}
