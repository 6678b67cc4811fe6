use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::DEFAULT_MAX_UPLOAD_BYTES;
use crate::analysis::DEFAULT_TOP_N;
use crate::extractor::{DEFAULT_MIN_TEXT_LEN, DEFAULT_OCR_WORKERS, DEFAULT_RENDER_DPI};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionSection>,
    pub ocr: Option<OcrSection>,
    pub analysis: Option<AnalysisSection>,
    pub server: Option<ServerSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    pub min_text_len: Option<usize>,
    pub render_dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrSection {
    pub language: Option<String>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// Replaces the built-in stop-word list.
    pub stop_words: Option<Vec<String>>,
    /// Added to the built-in (or replaced) stop-word list. When both the
    /// platform and the local file set it, the two lists are combined.
    pub extra_stop_words: Option<Vec<String>>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind_addr: Option<String>,
    pub max_upload_mb: Option<usize>,
}

impl ConfigFile {
    /// A fully populated file holding the built-in defaults, for `config --init`.
    ///
    /// The stop-word lists are left unset so the built-in list stays in effect.
    pub fn defaults() -> Self {
        Self {
            extraction: Some(ExtractionSection {
                min_text_len: Some(DEFAULT_MIN_TEXT_LEN),
                render_dpi: Some(DEFAULT_RENDER_DPI),
            }),
            ocr: Some(OcrSection {
                language: Some("eng".to_string()),
                workers: Some(DEFAULT_OCR_WORKERS),
            }),
            analysis: Some(AnalysisSection {
                stop_words: None,
                extra_stop_words: None,
                top_n: Some(DEFAULT_TOP_N),
            }),
            server: Some(ServerSection {
                bind_addr: Some("0.0.0.0:5001".to_string()),
                max_upload_mb: Some(DEFAULT_MAX_UPLOAD_BYTES / (1024 * 1024)),
            }),
        }
    }
}

/// Platform config directory path: `<config_dir>/pdfstats/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdfstats").join("config.toml"))
}

/// Load config by cascading CWD `.pdfstats.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pdfstats.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_ex = base.extraction.unwrap_or_default();
    let over_ex = overlay.extraction.unwrap_or_default();
    let base_ocr = base.ocr.unwrap_or_default();
    let over_ocr = overlay.ocr.unwrap_or_default();
    let base_an = base.analysis.unwrap_or_default();
    let over_an = overlay.analysis.unwrap_or_default();
    let base_srv = base.server.unwrap_or_default();
    let over_srv = overlay.server.unwrap_or_default();

    ConfigFile {
        extraction: Some(ExtractionSection {
            min_text_len: over_ex.min_text_len.or(base_ex.min_text_len),
            render_dpi: over_ex.render_dpi.or(base_ex.render_dpi),
        }),
        ocr: Some(OcrSection {
            language: over_ocr.language.or(base_ocr.language),
            workers: over_ocr.workers.or(base_ocr.workers),
        }),
        analysis: Some(AnalysisSection {
            stop_words: over_an.stop_words.or(base_an.stop_words),
            extra_stop_words: concat_lists(base_an.extra_stop_words, over_an.extra_stop_words),
            top_n: over_an.top_n.or(base_an.top_n),
        }),
        server: Some(ServerSection {
            bind_addr: over_srv.bind_addr.or(base_srv.bind_addr),
            max_upload_mb: over_srv.max_upload_mb.or(base_srv.max_upload_mb),
        }),
    }
}

fn concat_lists(base: Option<Vec<String>>, overlay: Option<Vec<String>>) -> Option<Vec<String>> {
    match (base, overlay) {
        (Some(mut b), Some(o)) => {
            b.extend(o);
            Some(b)
        }
        (b, o) => o.or(b),
    }
}

/// Save a config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}
