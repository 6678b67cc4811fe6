use pdfstats_core::DocumentAnalyzer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub analyzer: DocumentAnalyzer,
    pub max_upload_bytes: usize,
}
