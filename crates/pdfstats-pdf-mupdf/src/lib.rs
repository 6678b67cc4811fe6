use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use mupdf::{Colorspace, Document, Matrix, Page, TextPageFlags};

use pdfstats_core::{BackendError, PageImage, PdfBackend};

/// MuPDF points per inch; page geometry is expressed in points.
const POINTS_PER_INCH: f32 = 72.0;

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the analysis code does not transitively
/// depend on it.
///
/// Documents are opened straight from memory; nothing is written to disk.
/// Rendered pages are grayscale, which is all Tesseract needs.
#[derive(Debug, Clone, Default)]
pub struct MupdfBackend {
    /// Leave typographic ligatures (ﬁ, ﬂ, ...) in extracted text instead of
    /// expanding them to plain letters.
    keep_ligatures: bool,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave ligature code points in extracted text untouched.
    pub fn with_ligatures_preserved(mut self) -> Self {
        self.keep_ligatures = true;
        self
    }

    fn open(data: &[u8]) -> Result<Document, BackendError> {
        Document::from_bytes(data, "application/pdf")
            .map_err(|e| BackendError::OpenError(e.to_string()))
    }

    fn page_text(page: &Page) -> Result<String, BackendError> {
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        // Block/line iteration keeps one output line per layout line.
        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                page_text.push_str(&line_text);
                page_text.push('\n');
            }
        }
        Ok(page_text)
    }

    fn render_page(page: &Page, index: usize, dpi: u32) -> Result<PageImage, BackendError> {
        let render_err = |message: String| BackendError::RenderError {
            page: index + 1,
            message,
        };

        let scale = dpi as f32 / POINTS_PER_INCH;
        let pixmap = page
            .to_pixmap(
                &Matrix::new_scale(scale, scale),
                &Colorspace::device_gray(),
                false,
                false,
            )
            .map_err(|e| render_err(e.to_string()))?;

        let width = pixmap.width();
        let height = pixmap.height();
        let png = encode_png(width, height, pixmap.n() as usize, pixmap.samples())
            .map_err(render_err)?;

        Ok(PageImage {
            index,
            width,
            height,
            png,
        })
    }
}

/// Encode a tightly packed gray or RGB sample buffer as PNG.
fn encode_png(width: u32, height: u32, channels: usize, samples: &[u8]) -> Result<Vec<u8>, String> {
    let expected = width as usize * height as usize * channels;
    if samples.len() != expected {
        return Err(format!(
            "pixmap has {} samples, expected {expected} for {width}x{height}x{channels}",
            samples.len()
        ));
    }

    let pixels = samples.to_vec();
    let image = match channels {
        1 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        _ => None,
    }
    .ok_or_else(|| format!("unsupported pixmap with {channels} channels"))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(png)
}

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, data: &[u8]) -> Result<String, BackendError> {
        let document = Self::open(data)?;

        let mut pages_text = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            pages_text.push(Self::page_text(&page)?);
        }
        tracing::debug!(pages = pages_text.len(), "extracted embedded text");

        let text = pages_text.join("\n");
        if self.keep_ligatures {
            Ok(text)
        } else {
            Ok(expand_ligatures(&text))
        }
    }

    fn render_pages(&self, data: &[u8], dpi: u32) -> Result<Vec<PageImage>, BackendError> {
        let document = Self::open(data)?;

        let mut images = Vec::new();
        for (index, page_result) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::RenderError {
                page: index + 1,
                message: e.to_string(),
            })?;
            images.push(Self::render_page(&page, index, dpi)?);
        }
        tracing::debug!(pages = images.len(), dpi, "rendered pages for OCR");
        Ok(images)
    }
}
