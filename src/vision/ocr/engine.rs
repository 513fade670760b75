// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition collaborator traits
//!
//! Implementations are loaded once at startup and shared read-only across
//! requests, so both traits require `Send + Sync`.

use super::page::{LinePage, RecognitionPage};
use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;

/// Full text detection plus recognition over an arbitrary image
#[async_trait]
pub trait FullTextRecognizer: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    async fn predict(&self, image: &DynamicImage) -> Result<Vec<RecognitionPage>>;
}

/// Recognition of a single pre-cropped text line, without geometry
#[async_trait]
pub trait LineTextRecognizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn predict(&self, line: &DynamicImage) -> Result<Vec<LinePage>>;
}
