//! Text statistics and word frequencies for PDF documents.
//!
//! A request flows one way: PDF bytes go through the [`Extractor`] (direct
//! parse, OCR fallback) and the resulting text goes through the [`Analyzer`].
//! [`DocumentAnalyzer`] wires the two together behind
//! [`analyze_document`](DocumentAnalyzer::analyze_document).

use std::sync::Arc;

use thiserror::Error;

pub mod analysis;
pub mod backend;
pub mod config_file;
pub mod extractor;
pub mod ocr;
pub mod stop_words;

// Re-export for convenience
pub use analysis::{
    AnalysisReport, Analyzer, DEFAULT_TOP_N, TextStats, WordCount, analyze_frequency,
    analyze_stats,
};
pub use backend::{BackendError, PageImage, PdfBackend};
pub use config_file::ConfigFile;
pub use extractor::{ExtractionConfig, ExtractionError, Extractor};
pub use ocr::{OcrEngine, OcrError, TesseractEngine};
pub use stop_words::{DEFAULT_STOP_WORDS, ListOverride, StopWords};

/// Upload size accepted by the boundaries (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

impl DocumentError {
    /// Whether the caller sent something unusable, as opposed to a
    /// processing failure on our side.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DocumentError::InvalidInput(_))
    }
}

/// Resolved configuration for extraction, analysis and the boundaries.
#[derive(Debug, Clone)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub ocr_language: String,
    pub stop_words: StopWords,
    pub top_n: usize,
    pub max_upload_bytes: usize,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            ocr_language: "eng".to_string(),
            stop_words: StopWords::default(),
            top_n: DEFAULT_TOP_N,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            bind_addr: "0.0.0.0:5001".to_string(),
        }
    }
}

impl Config {
    /// Resolve an on-disk config against the defaults.
    pub fn from_file(file: &ConfigFile) -> Self {
        let defaults = Self::default();

        let extraction = file.extraction.clone().unwrap_or_default();
        let ocr = file.ocr.clone().unwrap_or_default();
        let analysis = file.analysis.clone().unwrap_or_default();
        let server = file.server.clone().unwrap_or_default();

        let stop_words = StopWords::from_override(&ListOverride::from_parts(
            analysis.stop_words,
            analysis.extra_stop_words,
        ));

        Self {
            extraction: ExtractionConfig {
                min_text_len: extraction
                    .min_text_len
                    .unwrap_or(defaults.extraction.min_text_len),
                ocr_workers: ocr.workers.unwrap_or(defaults.extraction.ocr_workers),
                render_dpi: extraction
                    .render_dpi
                    .unwrap_or(defaults.extraction.render_dpi),
            },
            ocr_language: ocr.language.unwrap_or(defaults.ocr_language),
            stop_words,
            top_n: analysis.top_n.unwrap_or(defaults.top_n),
            max_upload_bytes: server
                .max_upload_mb
                .map(|mb| {
                    mib_to_bytes(mb).unwrap_or_else(|| {
                        tracing::warn!(max_upload_mb = mb, "upload limit too large, capping");
                        usize::MAX
                    })
                })
                .unwrap_or(defaults.max_upload_bytes),
            bind_addr: server.bind_addr.unwrap_or(defaults.bind_addr),
        }
    }
}

/// Environment variables understood by [`Config::apply_env`].
pub const ENV_BIND: &str = "PDFSTATS_BIND";
pub const ENV_OCR_WORKERS: &str = "PDFSTATS_OCR_WORKERS";
pub const ENV_OCR_LANG: &str = "PDFSTATS_OCR_LANG";
pub const ENV_MIN_TEXT_LEN: &str = "PDFSTATS_MIN_TEXT_LEN";
pub const ENV_MAX_UPLOAD_MB: &str = "PDFSTATS_MAX_UPLOAD_MB";

impl Config {
    /// Layer `PDFSTATS_*` process environment variables over this config.
    pub fn apply_env(&mut self) -> Result<(), String> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Layer overrides from `lookup` (keyed by the `ENV_*` names) over this config.
    ///
    /// Numeric values that fail to parse are reported, not ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |name: &str| -> Result<Option<usize>, String> {
            match lookup(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| format!("{name} must be a non-negative integer, got {raw:?}")),
                None => Ok(None),
            }
        };

        if let Some(addr) = lookup(ENV_BIND) {
            self.bind_addr = addr;
        }
        if let Some(lang) = lookup(ENV_OCR_LANG) {
            self.ocr_language = lang;
        }
        if let Some(workers) = number(ENV_OCR_WORKERS)? {
            self.extraction.ocr_workers = workers;
        }
        if let Some(min) = number(ENV_MIN_TEXT_LEN)? {
            self.extraction.min_text_len = min;
        }
        if let Some(mb) = number(ENV_MAX_UPLOAD_MB)? {
            self.max_upload_bytes = mib_to_bytes(mb)
                .ok_or_else(|| format!("{ENV_MAX_UPLOAD_MB} is too large: {mb}"))?;
        }
        Ok(())
    }
}

fn mib_to_bytes(mb: usize) -> Option<usize> {
    mb.checked_mul(1024 * 1024)
}

/// Reject buffers that are not worth handing to the extractor.
///
/// `declared_type` is the MIME type claimed by the client, if any.
pub fn check_pdf_input(
    data: &[u8],
    declared_type: Option<&str>,
    max_bytes: usize,
) -> Result<(), DocumentError> {
    if data.is_empty() {
        return Err(DocumentError::InvalidInput("file is empty".to_string()));
    }
    if data.len() > max_bytes {
        return Err(DocumentError::InvalidInput(format!(
            "file is {} bytes, limit is {} bytes",
            data.len(),
            max_bytes
        )));
    }
    if let Some(mime) = declared_type {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if !essence.eq_ignore_ascii_case("application/pdf") {
            return Err(DocumentError::InvalidInput(format!(
                "expected application/pdf, got {essence}"
            )));
        }
    }
    if !data.starts_with(b"%PDF-") {
        return Err(DocumentError::InvalidInput(
            "file doesn't appear to be a valid PDF".to_string(),
        ));
    }
    Ok(())
}

/// Extractor and analyzer composed into the single document entry point.
#[derive(Debug, Clone)]
pub struct DocumentAnalyzer {
    extractor: Extractor,
    analyzer: Analyzer,
}

impl DocumentAnalyzer {
    pub fn new(extractor: Extractor, analyzer: Analyzer) -> Self {
        Self {
            extractor,
            analyzer,
        }
    }

    /// Build from a resolved [`Config`] and ready backend/OCR handles.
    pub fn from_config(
        config: &Config,
        backend: Arc<dyn PdfBackend>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self::new(
            Extractor::new(backend, ocr, config.extraction.clone()),
            Analyzer::new(config.stop_words.clone(), config.top_n),
        )
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Extract the text of `data`, then compute its statistics and word
    /// frequencies. Nothing is returned unless extraction succeeds.
    pub async fn analyze_document(&self, data: Vec<u8>) -> Result<AnalysisReport, DocumentError> {
        let size = data.len();
        let text = self.extractor.extract(data).await?;
        let report = self.analyzer.analyze(&text);
        tracing::info!(
            bytes = size,
            words = report.stats.word_count,
            distinct_ranked = report.word_frequency.len(),
            "document analyzed"
        );
        Ok(report)
    }
}
