use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pdfstats_core::{
    Config, ConfigFile, DocumentAnalyzer, ListOverride, OcrEngine, OcrError, PageImage,
    TesseractEngine, check_pdf_input, config_file,
};
use pdfstats_pdf_mupdf::MupdfBackend;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod output;

use output::ColorMode;

/// PDF text statistics - word counts, sentence counts and top words, with OCR for scanned documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the text of a PDF and report its statistics and most frequent words
    Analyze {
        /// Path to the PDF file to analyze
        file_path: PathBuf,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Number of top words to report
        #[arg(long)]
        top: Option<usize>,

        /// Embedded text must be longer than this (after trimming) to skip OCR
        #[arg(long)]
        min_text_len: Option<usize>,

        /// Number of pages recognized in parallel during OCR
        #[arg(long)]
        ocr_workers: Option<usize>,

        /// Tesseract language code (e.g. eng, deu)
        #[arg(long)]
        ocr_lang: Option<String>,

        /// Comma-separated stop words replacing the built-in list
        #[arg(long, value_delimiter = ',')]
        stop_words: Option<Vec<String>>,

        /// Comma-separated stop words added to the active list
        #[arg(long, value_delimiter = ',')]
        extra_stop_words: Vec<String>,

        /// Show extraction progress logs
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the config file location and its current contents
    Config {
        /// Write a config file populated with the defaults if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Flags that override the config file and environment.
#[derive(Debug, Default)]
struct Overrides {
    top: Option<usize>,
    min_text_len: Option<usize>,
    ocr_workers: Option<usize>,
    ocr_lang: Option<String>,
    stop_words: Option<Vec<String>>,
    extra_stop_words: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file_path,
            json,
            no_color,
            top,
            min_text_len,
            ocr_workers,
            ocr_lang,
            stop_words,
            extra_stop_words,
            verbose,
        } => {
            init_tracing(verbose);
            let overrides = Overrides {
                top,
                min_text_len,
                ocr_workers,
                ocr_lang,
                stop_words,
                extra_stop_words,
            };
            let color = ColorMode(!no_color && !json && std::io::stdout().is_terminal());
            analyze(&file_path, json, color, overrides).await
        }
        Command::Config { init } => {
            init_tracing(false);
            show_config(init)
        }
    }
}

/// Logs go to stderr so `--json` output stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pdfstats_core=info,pdfstats_pdf_mupdf=info,pdfstats=info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(overrides: Overrides) -> anyhow::Result<Config> {
    let mut config = Config::from_file(&config_file::load_config());
    config.apply_env().map_err(anyhow::Error::msg)?;
    apply_overrides(&mut config, overrides);
    Ok(config)
}

fn apply_overrides(config: &mut Config, overrides: Overrides) {
    if let Some(top) = overrides.top {
        config.top_n = top;
    }
    if let Some(min) = overrides.min_text_len {
        config.extraction.min_text_len = min;
    }
    if let Some(workers) = overrides.ocr_workers {
        config.extraction.ocr_workers = workers;
    }
    if let Some(lang) = overrides.ocr_lang {
        config.ocr_language = lang;
    }
    let extra = (!overrides.extra_stop_words.is_empty()).then_some(overrides.extra_stop_words);
    config
        .stop_words
        .apply(&ListOverride::from_parts(overrides.stop_words, extra));
}

async fn analyze(
    file_path: &Path,
    json: bool,
    color: ColorMode,
    overrides: Overrides,
) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;

    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let data = std::fs::read(file_path)
        .with_context(|| format!("failed to read {}", file_path.display()))?;
    check_pdf_input(&data, None, config.max_upload_bytes)?;

    let ocr: Arc<dyn OcrEngine> = match TesseractEngine::initialize(&config.ocr_language) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            // Text-layer PDFs still work; only the OCR fallback is lost.
            tracing::warn!(error = %e, "OCR disabled");
            Arc::new(UnavailableOcr(e.to_string()))
        }
    };
    let analyzer = DocumentAnalyzer::from_config(&config, Arc::new(MupdfBackend::new()), ocr);

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Extracting text from {}...", file_name));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = analyzer.analyze_document(data).await;
    spinner.finish_and_clear();
    let report = result?;

    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
    } else {
        output::print_report(&mut stdout, &file_name, &report, color)?;
    }
    Ok(())
}

fn show_config(init: bool) -> anyhow::Result<()> {
    let path = config_file::config_path();

    if init {
        if let Some(existing) = path.as_ref().filter(|p| p.exists()) {
            println!("Config already exists at {}", existing.display());
            return Ok(());
        }
        let written = config_file::save_config(&ConfigFile::defaults()).map_err(anyhow::Error::msg)?;
        println!("Wrote default config to {}", written.display());
        return Ok(());
    }

    match path {
        Some(p) => println!("# Platform config: {}", p.display()),
        None => println!("# Platform config: (no config directory on this platform)"),
    }
    println!("# Local override: ./.pdfstats.toml");
    println!();
    let effective = toml::to_string_pretty(&config_file::load_config())?;
    if effective.trim().is_empty() {
        println!("# (no settings; built-in defaults apply)");
    } else {
        print!("{}", effective);
    }
    Ok(())
}

/// Stand-in OCR engine used when tesseract could not be initialized.
struct UnavailableOcr(String);

impl OcrEngine for UnavailableOcr {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn recognize(&self, _page: &PageImage) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable(self.0.clone()))
    }
}
