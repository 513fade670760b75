// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR upload extraction and validation

use axum::body::Bytes;
use axum_extra::extract::Multipart;
use tracing::debug;

use crate::api::errors::ApiError;

/// Form field that carries the photo
pub const FILE_FIELD: &str = "file";

/// The uploaded photo, still encoded
#[derive(Debug, Clone)]
pub struct OcrUpload {
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl OcrUpload {
    /// Pull the photo out of a multipart form
    ///
    /// The field named `file` wins; otherwise the first field carrying a file
    /// name is used. Other fields are ignored.
    pub async fn from_multipart(
        multipart: &mut Multipart,
        max_bytes: usize,
    ) -> Result<Self, ApiError> {
        let mut fallback: Option<OcrUpload> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {}", e)))?
        {
            let is_file_field = field.name() == Some(FILE_FIELD);
            let file_name = field.file_name().map(str::to_string);
            if !is_file_field && (file_name.is_none() || fallback.is_some()) {
                continue;
            }

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("failed to read upload: {}", e)))?;
            let upload = OcrUpload { file_name, data };
            upload.validate(max_bytes)?;

            if is_file_field {
                return Ok(upload);
            }
            debug!("Using unnamed file field {:?} as upload", upload.file_name);
            fallback = Some(upload);
        }

        fallback.ok_or_else(|| {
            ApiError::InvalidRequest(format!("multipart field '{}' is required", FILE_FIELD))
        })
    }

    pub fn validate(&self, max_bytes: usize) -> Result<(), ApiError> {
        if self.data.is_empty() {
            return Err(ApiError::InvalidRequest("uploaded file is empty".to_string()));
        }
        if self.data.len() > max_bytes {
            return Err(ApiError::InvalidRequest(format!(
                "uploaded file exceeds maximum size of {} bytes",
                max_bytes
            )));
        }
        Ok(())
    }
}
