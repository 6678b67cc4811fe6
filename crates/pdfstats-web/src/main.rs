use std::sync::Arc;

use anyhow::Context;
use pdfstats_core::{Config, DocumentAnalyzer, TesseractEngine, config_file};
use pdfstats_pdf_mupdf::MupdfBackend;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod handlers;
mod models;
mod routes;
mod state;
mod upload;

use state::AppState;

const DEFAULT_LOG_FILTER: &str = "pdfstats_core=info,pdfstats_pdf_mupdf=info,pdfstats_web=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_file(&config_file::load_config());
    config.apply_env().map_err(anyhow::Error::msg)?;

    // Fail at startup rather than on the first scanned upload.
    let ocr = TesseractEngine::initialize(&config.ocr_language)
        .context("OCR engine unavailable; install tesseract or set PDFSTATS_OCR_LANG")?;

    let analyzer = DocumentAnalyzer::from_config(
        &config,
        Arc::new(MupdfBackend::new()),
        Arc::new(ocr),
    );
    let state = Arc::new(AppState {
        analyzer,
        max_upload_bytes: config.max_upload_bytes,
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        ocr_workers = config.extraction.ocr_workers,
        min_text_len = config.extraction.min_text_len,
        "listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
