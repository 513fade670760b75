// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversion of collaborator pages into uniform `RecognitionItem`s
//!
//! Malformed entries are skipped one at a time; a bad entry never aborts the
//! rest of the page.

use super::page::{LinePage, Polygon, RecognitionItem, RecognitionPage, StructuredPage};
use serde_json::Value;
use tracing::debug;

/// Flatten full-collaborator pages into items, preserving engine order
pub fn normalize_pages(pages: &[RecognitionPage]) -> Vec<RecognitionItem> {
    pages.iter().flat_map(normalize_page).collect()
}

pub fn normalize_page(page: &RecognitionPage) -> Vec<RecognitionItem> {
    match page {
        RecognitionPage::Structured(structured) => normalize_structured(structured),
        RecognitionPage::Legacy(entries) => normalize_legacy(entries),
    }
}

/// Line-collaborator pages become geometry-less items
pub fn normalize_line_pages(pages: &[LinePage]) -> Vec<RecognitionItem> {
    pages
        .iter()
        .filter_map(|page| {
            let text = page.rec_text.as_ref().and_then(parse_text);
            let confidence = page.rec_score.as_ref().and_then(parse_confidence);
            match (text, confidence) {
                (Some(text), Some(confidence)) => {
                    Some(RecognitionItem::new(Polygon::new(), text, confidence))
                }
                _ => {
                    debug!("Skipping line page without usable text/score: {:?}", page);
                    None
                }
            }
        })
        .collect()
}

fn normalize_structured(page: &StructuredPage) -> Vec<RecognitionItem> {
    let texts = page.rec_texts.as_deref().unwrap_or_default();
    let scores = page.rec_scores.as_deref().unwrap_or_default();
    let polygons = page.dt_polys.as_deref().unwrap_or_default();

    // Parallel lists are truncated to the shorter of texts and scores
    let count = texts.len().min(scores.len());
    if texts.len() != scores.len() {
        debug!(
            "Structured page has {} texts and {} scores, keeping {}",
            texts.len(),
            scores.len(),
            count
        );
    }

    (0..count)
        .filter_map(|i| {
            let text = parse_text(&texts[i])?;
            let confidence = parse_confidence(&scores[i])?;
            let polygon = polygons.get(i).map(parse_polygon).unwrap_or_default();
            Some(RecognitionItem::new(polygon, text, confidence))
        })
        .collect()
}

fn normalize_legacy(entries: &[Value]) -> Vec<RecognitionItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let parts = entry.as_array().filter(|parts| parts.len() >= 2)?;
            let recognized = parts[1].as_array().filter(|pair| pair.len() >= 2)?;
            let text = parse_text(&recognized[0])?;
            let confidence = parse_confidence(&recognized[1])?;
            Some(RecognitionItem::new(
                parse_polygon(&parts[0]),
                text,
                confidence,
            ))
        })
        .collect()
}

/// Text from a string, number or bool; `None` for null, arrays and objects
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Confidence from a number or numeric string, clamped to `[0, 1]`
pub fn parse_confidence(value: &Value) -> Option<f32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if raw.is_nan() {
        return None;
    }
    Some(raw.clamp(0.0, 1.0) as f32)
}

/// Polygon from `[[x, y], ...]`; anything malformed yields an empty polygon
pub fn parse_polygon(value: &Value) -> Polygon {
    let Some(points) = value.as_array() else {
        return Polygon::new();
    };

    let mut polygon = Polygon::with_capacity(points.len());
    for point in points {
        let coords = match point.as_array() {
            Some(coords) if coords.len() >= 2 => coords,
            _ => return Polygon::new(),
        };
        match (coords[0].as_f64(), coords[1].as_f64()) {
            (Some(x), Some(y)) => polygon.push([x as f32, y as f32]),
            _ => return Polygon::new(),
        }
    }
    polygon
}
