// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::request::OcrUpload;
use super::response::OcrResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::decode_image_bytes;

/// POST /ocr - Read the text on a pink label
///
/// # Request
/// Multipart form with the photo in a field named `file` (the first file
/// field is accepted when none is named `file`).
///
/// # Response
/// - `results`: `{ box, text, confidence }` items in reading order
/// - `profiling`: strategy taken, label box, line count and stage timings
///
/// # Errors
/// - 400 Bad Request: missing or oversized upload, undecodable image
/// - 503 Service Unavailable: no recognition backend loaded
/// - 500 Internal Server Error: recognition failed
pub async fn ocr_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<OcrResponse>, ApiError> {
    let start = Instant::now();

    // 1. Extract upload
    let mut multipart = multipart.map_err(|e| {
        warn!("OCR request is not a multipart form: {}", e);
        ApiError::InvalidRequest(format!("expected multipart/form-data: {}", e))
    })?;
    let upload = OcrUpload::from_multipart(&mut multipart, state.max_upload_bytes)
        .await
        .map_err(|e| {
            warn!("OCR upload rejected: {}", e);
            e
        })?;

    // 2. Recognition backend
    let dispatcher = state.dispatcher.as_ref().ok_or_else(|| {
        warn!("OCR backend not loaded");
        ApiError::ServiceUnavailable("OCR backend not loaded".to_string())
    })?;

    // 3. Decode
    let decode_start = Instant::now();
    let (image, image_info) = decode_image_bytes(&upload.data, state.max_upload_bytes).map_err(|e| {
        warn!("Failed to decode image: {}", e);
        ApiError::from(e)
    })?;
    let decode_ms = decode_start.elapsed().as_secs_f64() * 1000.0;

    debug!(
        "Decoded image {:?}: {}x{}, {} bytes",
        upload.file_name, image_info.width, image_info.height, image_info.size_bytes
    );

    // 4. Dispatch
    let result = dispatcher.dispatch(&image).await?;

    let total_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        "OCR complete: {} items via {}, {:.1}ms",
        result.items.len(),
        result.outcome,
        total_ms
    );

    Ok(Json(OcrResponse::from_dispatch(result, decode_ms, total_ms)))
}
