// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use fabstir_label_ocr::{
    api::{start_server, AppState},
    cli::Cli,
    version,
    vision::{RecognitionDispatcher, RecognitionModelManager},
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    tracing::info!("🚀 Starting {}", version::get_version_string());
    tracing::info!("📦 BUILD VERSION: {}", version::VERSION);

    let config = cli.resolve_config()?;
    tracing::info!(
        "Pipeline: max side {}, kernel {}, min area {:.3}, aspect {:?}",
        config.pipeline.max_image_side,
        config.pipeline.region.morph_kernel_size,
        config.pipeline.region.min_area_fraction,
        config.pipeline.region.aspect_ratio
    );

    // Recognition collaborators are loaded once and shared by every request
    tracing::info!("🧠 Loading {} recognition backend...", config.recognition.backend);
    let manager = RecognitionModelManager::new(&config.recognition).await;
    let info = manager.info();

    let dispatcher = manager.backends().map(|backends| {
        Arc::new(RecognitionDispatcher::new(
            config.pipeline.clone(),
            backends.full,
            backends.line,
        ))
    });

    if dispatcher.is_some() {
        tracing::info!("✅ Recognition backend ready: {}", info.name);
    } else {
        tracing::warn!(
            "⚠️ No recognition backend available ({}); /ocr will answer 503",
            info.backend
        );
    }

    let state = AppState::new(dispatcher, config.server.max_upload_bytes);
    start_server(&config.server, state).await
}
