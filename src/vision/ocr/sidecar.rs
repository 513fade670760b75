// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for an external PaddleOCR sidecar
//!
//! The sidecar accepts `POST /predict` with `{"image": <base64 PNG>, "mode": "full"|"line"}`
//! and answers `{"pages": [...]}` with raw PaddleOCR page results.

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::engine::{FullTextRecognizer, LineTextRecognizer};
use super::page::{LinePage, RecognitionPage};
use crate::vision::image_utils::encode_png_base64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictMode {
    Full,
    Line,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    image: &'a str,
    mode: PredictMode,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    pages: Vec<Value>,
}

/// Client for the PaddleOCR sidecar service
#[derive(Debug, Clone)]
pub struct SidecarClient {
    client: Client,
    endpoint: String,
}

impl SidecarClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build sidecar HTTP client")?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("PaddleOCR sidecar configured: endpoint={}", endpoint);

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check if the sidecar answers its health probe
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Sidecar health check failed: {}", e);
                false
            }
        }
    }

    /// Send one image and return the raw page values
    pub async fn predict_raw(&self, image: &DynamicImage, mode: PredictMode) -> Result<Vec<Value>> {
        let encoded = encode_png_base64(image)?;
        let response = self
            .client
            .post(format!("{}/predict", self.endpoint))
            .json(&PredictRequest {
                image: &encoded,
                mode,
            })
            .send()
            .await
            .context("Sidecar request failed")?
            .error_for_status()
            .context("Sidecar returned an error status")?;

        let body: PredictResponse = response
            .json()
            .await
            .context("Sidecar response is not valid JSON")?;
        Ok(body.pages)
    }
}

/// Parse raw pages, dropping any that match neither page shape
pub fn parse_pages<T: serde::de::DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("Skipping unrecognized sidecar page: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl FullTextRecognizer for SidecarClient {
    fn name(&self) -> &'static str {
        "paddleocr-sidecar"
    }

    async fn predict(&self, image: &DynamicImage) -> Result<Vec<RecognitionPage>> {
        let raw = self.predict_raw(image, PredictMode::Full).await?;
        Ok(parse_pages(raw))
    }
}

#[async_trait]
impl LineTextRecognizer for SidecarClient {
    fn name(&self) -> &'static str {
        "paddleocr-sidecar"
    }

    async fn predict(&self, line: &DynamicImage) -> Result<Vec<LinePage>> {
        let raw = self.predict_raw(line, PredictMode::Line).await?;
        Ok(parse_pages(raw))
    }
}
