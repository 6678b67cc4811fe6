//! PDF text extraction with an OCR fallback.
//!
//! Direct parsing is tried first. When it yields no more than
//! [`ExtractionConfig::min_text_len`] characters (after trimming), the document
//! is treated as scanned: every page is rendered and handed to a bounded pool
//! of OCR workers. Workers finish in any order; results are tagged with their
//! page index and stitched back together in page order.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::backend::{BackendError, PageImage, PdfBackend};
use crate::ocr::{OcrEngine, OcrError};

/// Characters direct parsing must exceed before OCR is skipped.
pub const DEFAULT_MIN_TEXT_LEN: usize = 50;
/// Pages OCR'd concurrently.
pub const DEFAULT_OCR_WORKERS: usize = 4;
/// Render resolution for OCR page images.
pub const DEFAULT_RENDER_DPI: u32 = 200;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("OCR failed on page {page}: {source}")]
    Ocr {
        /// 1-based page number.
        page: usize,
        #[source]
        source: OcrError,
    },
    #[error("document has no pages")]
    NoPages,
    #[error("extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub min_text_len: usize,
    pub ocr_workers: usize,
    pub render_dpi: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_len: DEFAULT_MIN_TEXT_LEN,
            ocr_workers: DEFAULT_OCR_WORKERS,
            render_dpi: DEFAULT_RENDER_DPI,
        }
    }
}

/// Turns a PDF buffer into plain text.
///
/// Holds only shared, immutable handles, so one instance can serve any number
/// of concurrent requests.
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrEngine>,
    config: ExtractionConfig,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("ocr", &self.ocr.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Extractor {
    pub fn new(
        backend: Arc<dyn PdfBackend>,
        ocr: Arc<dyn OcrEngine>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            backend,
            ocr,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract the text of a PDF held in memory.
    pub async fn extract(&self, data: Vec<u8>) -> Result<String, ExtractionError> {
        let data: Arc<[u8]> = data.into();
        let started = Instant::now();

        let backend = Arc::clone(&self.backend);
        let bytes = Arc::clone(&data);
        let text = tokio::task::spawn_blocking(move || backend.extract_text(&bytes))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))??;

        let usable = text.trim().chars().count();
        if usable > self.config.min_text_len {
            tracing::debug!(
                chars = usable,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "direct text extraction succeeded"
            );
            return Ok(text);
        }

        tracing::info!(
            chars = usable,
            threshold = self.config.min_text_len,
            "too little embedded text, falling back to OCR"
        );

        let backend = Arc::clone(&self.backend);
        let dpi = self.config.render_dpi;
        let pages = tokio::task::spawn_blocking(move || backend.render_pages(&data, dpi))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))??;

        if pages.is_empty() {
            return Err(ExtractionError::NoPages);
        }

        let page_count = pages.len();
        let text = self.ocr_pages(pages).await?;
        tracing::info!(
            pages = page_count,
            engine = self.ocr.name(),
            chars = text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "OCR extraction complete"
        );
        Ok(text)
    }

    /// OCR every page on up to `ocr_workers` workers and join the results in
    /// page order, each followed by a newline.
    async fn ocr_pages(&self, pages: Vec<PageImage>) -> Result<String, ExtractionError> {
        let total = pages.len();
        let num_workers = self.config.ocr_workers.clamp(1, total);

        let (job_tx, job_rx) = async_channel::unbounded::<(usize, PageImage)>();
        let (result_tx, result_rx) =
            async_channel::unbounded::<(usize, Result<String, OcrError>)>();

        for (slot, page) in pages.into_iter().enumerate() {
            // The receiver is held below, so the send cannot fail.
            let _ = job_tx.send((slot, page)).await;
        }
        job_tx.close();

        let mut handles = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            handles.push(tokio::spawn(ocr_worker(
                job_rx.clone(),
                result_tx.clone(),
                Arc::clone(&self.ocr),
            )));
        }
        // Workers hold the remaining clones; the result channel closes when
        // the last one exits.
        drop(result_tx);

        let mut texts: Vec<Option<String>> = vec![None; total];
        while let Ok((slot, outcome)) = result_rx.recv().await {
            match outcome {
                Ok(text) => {
                    tracing::debug!(page = slot + 1, total, "page recognised");
                    texts[slot] = Some(text);
                }
                Err(source) => {
                    // Drain the queue so no further pages start; in-flight
                    // pages finish and their results are dropped.
                    while job_rx.try_recv().is_ok() {}
                    return Err(ExtractionError::Ocr {
                        page: slot + 1,
                        source,
                    });
                }
            }
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| ExtractionError::Task(e.to_string()))?;
        }

        let mut out = String::new();
        for (slot, text) in texts.into_iter().enumerate() {
            let text = text.ok_or_else(|| {
                ExtractionError::Task(format!("no OCR result for page {}", slot + 1))
            })?;
            out.push_str(&text);
            out.push('\n');
        }
        Ok(out)
    }
}

async fn ocr_worker(
    jobs: async_channel::Receiver<(usize, PageImage)>,
    results: async_channel::Sender<(usize, Result<String, OcrError>)>,
    engine: Arc<dyn OcrEngine>,
) {
    while let Ok((slot, page)) = jobs.recv().await {
        let engine = Arc::clone(&engine);
        let outcome = tokio::task::spawn_blocking(move || engine.recognize(&page))
            .await
            .unwrap_or_else(|e| Err(OcrError::Failed(format!("OCR task panicked: {e}"))));
        if results.send((slot, outcome)).await.is_err() {
            break;
        }
    }
}
