use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to render page {page}: {message}")]
    RenderError { page: usize, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single rasterised page, held in memory as PNG.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based position of the page in the document.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Trait for PDF backends.
///
/// Implementors provide the two low-level operations the extractor needs:
/// reading the text embedded in the document structure, and rendering pages
/// to images for OCR when the document carries no usable text layer.
pub trait PdfBackend: Send + Sync {
    /// Extract the embedded text of every page, in page order.
    fn extract_text(&self, data: &[u8]) -> Result<String, BackendError>;

    /// Render every page to a PNG image at the given resolution.
    ///
    /// The returned images are ordered by page and their `index` fields
    /// run from 0 to `len - 1`.
    fn render_pages(&self, data: &[u8], dpi: u32) -> Result<Vec<PageImage>, BackendError>;
}
