//! OCR engines.
//!
//! The extractor talks to OCR through [`OcrEngine`]. The production engine is
//! [`TesseractEngine`], which shells out to the system `tesseract` binary and
//! streams page images through stdin/stdout so nothing is written to disk.

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::backend::PageImage;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),
    #[error("OCR failed: {0}")]
    Failed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recognises text in a rendered page image.
pub trait OcrEngine: Send + Sync {
    /// Short engine name used in log output.
    fn name(&self) -> &str;

    /// Run recognition on one page and return its text.
    fn recognize(&self, page: &PageImage) -> Result<String, OcrError>;
}

/// Tesseract OCR via the command-line binary.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    language: String,
    version: String,
}

impl TesseractEngine {
    /// Probe the `tesseract` binary on `PATH` and return a ready engine.
    ///
    /// Fails with [`OcrError::NotAvailable`] when the binary cannot be run.
    pub fn initialize(language: &str) -> Result<Self, OcrError> {
        Self::initialize_with_binary("tesseract", language)
    }

    /// Like [`initialize`](Self::initialize) but with an explicit binary path.
    pub fn initialize_with_binary(binary: &str, language: &str) -> Result<Self, OcrError> {
        let output = match Command::new(binary).arg("--version").output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::NotAvailable(format!(
                    "{binary} not found (install tesseract-ocr)"
                )));
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        if !output.status.success() {
            return Err(OcrError::NotAvailable(format!(
                "{binary} --version exited with {}",
                output.status
            )));
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).to_string()
        };
        let version = banner.lines().next().unwrap_or("tesseract").trim().to_string();

        tracing::info!(%version, language, "tesseract OCR engine ready");

        Ok(Self {
            binary: binary.to_string(),
            language: language.to_string(),
            version,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, page: &PageImage) -> Result<String, OcrError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OcrError::NotAvailable(format!("{} not found", self.binary))
                }
                _ => OcrError::Io(e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Failed("tesseract stdin unavailable".to_string()))?;

        // Feed the image from a separate thread so a full stdout pipe can't
        // stall the write.
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&page.png));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "tesseract failed on page {}: {}",
                page.index + 1,
                stderr.trim()
            )));
        }
        written?;

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
