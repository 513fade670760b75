// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition collaborator page shapes and the uniform output record

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered polygon vertices as `[x, y]` pairs
pub type Polygon = Vec<[f32; 2]>;

/// One page returned by the full detect+recognize collaborator
///
/// Engines answer either with a mapping of parallel lists or with the older
/// list of `[polygon, [text, confidence]]` entries. `Legacy` is listed first so
/// a JSON array is never mistaken for a positional `StructuredPage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecognitionPage {
    Legacy(Vec<Value>),
    Structured(StructuredPage),
}

/// Mapping-shaped page: detected polygons, texts and scores as parallel lists
///
/// Any list may be absent or `null`; polygons may be shorter than the texts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredPage {
    pub dt_polys: Option<Vec<Value>>,
    pub rec_texts: Option<Vec<Value>>,
    pub rec_scores: Option<Vec<Value>>,
}

impl StructuredPage {
    /// Build a page from typed engine output
    pub fn from_parts(polygons: Vec<Polygon>, texts: Vec<String>, scores: Vec<f32>) -> Self {
        Self {
            dt_polys: Some(polygons.into_iter().map(polygon_value).collect()),
            rec_texts: Some(texts.into_iter().map(Value::String).collect()),
            rec_scores: Some(scores.into_iter().map(|s| Value::from(s as f64)).collect()),
        }
    }
}

fn polygon_value(polygon: Polygon) -> Value {
    Value::Array(
        polygon
            .into_iter()
            .map(|[x, y]| Value::Array(vec![Value::from(x as f64), Value::from(y as f64)]))
            .collect(),
    )
}

/// One page returned by the line-only collaborator: a single text, no geometry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePage {
    pub rec_text: Option<Value>,
    pub rec_score: Option<Value>,
}

impl LinePage {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            rec_text: Some(Value::String(text.into())),
            rec_score: Some(Value::from(score as f64)),
        }
    }
}

/// Uniform recognition record returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionItem {
    /// Text polygon in source-image pixels; empty when the engine gave no geometry
    #[serde(rename = "box")]
    pub polygon: Polygon,
    pub text: String,
    /// Always within `[0, 1]`
    pub confidence: f32,
}

impl RecognitionItem {
    pub fn new(polygon: Polygon, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Scale polygon vertices by `scale` then shift them by `(dx, dy)`
    pub fn map_polygon(&mut self, scale: f32, dx: f32, dy: f32) {
        for point in &mut self.polygon {
            point[0] = point[0] * scale + dx;
            point[1] = point[1] * scale + dy;
        }
    }
}
