//! Integration tests for the [`Extractor`] and [`DocumentAnalyzer`].
//!
//! A hand-rolled PDF backend serves canned embedded text and page images, and
//! a hand-rolled OCR engine "recognises" a page by decoding its image bytes as
//! UTF-8. Both count their calls so the tests can assert which path ran.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pdfstats_core::{
    Analyzer, BackendError, DocumentAnalyzer, DocumentError, ExtractionConfig, ExtractionError,
    Extractor, OcrEngine, OcrError, PageImage, PdfBackend, StopWords, WordCount,
};

struct MockBackend {
    embedded: Result<String, String>,
    pages: Vec<String>,
    extract_calls: AtomicUsize,
    render_calls: AtomicUsize,
}

impl MockBackend {
    fn new(embedded: &str, pages: &[&str]) -> Self {
        Self {
            embedded: Ok(embedded.to_string()),
            pages: pages.iter().map(|p| p.to_string()).collect(),
            extract_calls: AtomicUsize::new(0),
            render_calls: AtomicUsize::new(0),
        }
    }

    fn broken(message: &str) -> Self {
        Self {
            embedded: Err(message.to_string()),
            pages: Vec::new(),
            extract_calls: AtomicUsize::new(0),
            render_calls: AtomicUsize::new(0),
        }
    }
}

impl PdfBackend for MockBackend {
    fn extract_text(&self, _data: &[u8]) -> Result<String, BackendError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.embedded
            .clone()
            .map_err(BackendError::OpenError)
    }

    fn render_pages(&self, _data: &[u8], _dpi: u32) -> Result<Vec<PageImage>, BackendError> {
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(index, text)| PageImage {
                index,
                width: 1,
                height: 1,
                png: text.as_bytes().to_vec(),
            })
            .collect())
    }
}

/// Recognises pages by decoding their bytes. Earlier pages sleep longer, so
/// completion order is the reverse of page order.
struct MockOcr {
    calls: AtomicUsize,
    fail_on: Option<usize>,
    page_count_hint: usize,
}

impl MockOcr {
    fn new(page_count_hint: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
            page_count_hint,
        }
    }

    fn failing_on(page_index: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(page_index),
            page_count_hint: 0,
        }
    }
}

impl OcrEngine for MockOcr {
    fn name(&self) -> &str {
        "mock"
    }

    fn recognize(&self, page: &PageImage) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(page.index) {
            return Err(OcrError::Failed("unreadable scan".to_string()));
        }
        let delay = self.page_count_hint.saturating_sub(page.index) as u64 * 20;
        std::thread::sleep(Duration::from_millis(delay));
        String::from_utf8(page.png.clone()).map_err(|e| OcrError::Failed(e.to_string()))
    }
}

fn extractor(backend: Arc<MockBackend>, ocr: Arc<MockOcr>, workers: usize) -> Extractor {
    Extractor::new(
        backend,
        ocr,
        ExtractionConfig {
            ocr_workers: workers,
            ..ExtractionConfig::default()
        },
    )
}

const LONG_TEXT: &str =
    "This document has a perfectly good text layer with well over fifty characters in it.";

#[tokio::test]
async fn long_embedded_text_skips_ocr() {
    let backend = Arc::new(MockBackend::new(LONG_TEXT, &["scan"]));
    let ocr = Arc::new(MockOcr::new(1));
    let text = extractor(backend.clone(), ocr.clone(), 2)
        .extract(b"%PDF-1.7".to_vec())
        .await
        .unwrap();

    assert_eq!(text, LONG_TEXT);
    assert_eq!(backend.extract_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.render_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn threshold_is_exclusive_and_measured_after_trim() {
    // Exactly 50 characters once the padding is trimmed: OCR must run.
    let fifty = format!("   {}   \n", "x".repeat(50));
    let backend = Arc::new(MockBackend::new(&fifty, &["ocr text"]));
    let ocr = Arc::new(MockOcr::new(1));
    let text = extractor(backend.clone(), ocr.clone(), 1)
        .extract(b"%PDF-1.7".to_vec())
        .await
        .unwrap();
    assert_eq!(text, "ocr text\n");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);

    // 51 characters: direct text is returned untrimmed.
    let fifty_one = format!(" {} ", "y".repeat(51));
    let backend = Arc::new(MockBackend::new(&fifty_one, &["unused"]));
    let ocr = Arc::new(MockOcr::new(1));
    let text = extractor(backend.clone(), ocr.clone(), 1)
        .extract(b"%PDF-1.7".to_vec())
        .await
        .unwrap();
    assert_eq!(text, fifty_one);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn configurable_threshold() {
    let backend = Arc::new(MockBackend::new("short but enough", &["scan"]));
    let ocr = Arc::new(MockOcr::new(1));
    let extractor = Extractor::new(
        backend,
        ocr.clone(),
        ExtractionConfig {
            min_text_len: 5,
            ..ExtractionConfig::default()
        },
    );
    let text = extractor.extract(b"%PDF-1.7".to_vec()).await.unwrap();
    assert_eq!(text, "short but enough");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ocr_output_keeps_page_order() {
    let pages = ["first page", "second page", "third page"];
    let backend = Arc::new(MockBackend::new("", &pages));
    let ocr = Arc::new(MockOcr::new(pages.len()));
    let text = extractor(backend.clone(), ocr.clone(), 3)
        .extract(b"%PDF-1.7".to_vec())
        .await
        .unwrap();

    assert_eq!(text, "first page\nsecond page\nthird page\n");
    assert_eq!(backend.render_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn single_worker_matches_parallel_output() {
    let pages = ["one", "two", "three", "four", "five"];
    let sequential = extractor(
        Arc::new(MockBackend::new("", &pages)),
        Arc::new(MockOcr::new(pages.len())),
        1,
    )
    .extract(b"%PDF-1.7".to_vec())
    .await
    .unwrap();
    let parallel = extractor(
        Arc::new(MockBackend::new("", &pages)),
        Arc::new(MockOcr::new(pages.len())),
        8,
    )
    .extract(b"%PDF-1.7".to_vec())
    .await
    .unwrap();

    assert_eq!(sequential, "one\ntwo\nthree\nfour\nfive\n");
    assert_eq!(sequential, parallel);
}

#[tokio::test]
async fn direct_parse_failure_is_reported_without_ocr() {
    let backend = Arc::new(MockBackend::broken("trailer not found"));
    let ocr = Arc::new(MockOcr::new(0));
    let err = extractor(backend.clone(), ocr.clone(), 2)
        .extract(b"garbage".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Backend(BackendError::OpenError(_))));
    assert!(err.to_string().contains("trailer not found"));
    assert_eq!(backend.render_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ocr_failure_fails_whole_extraction() {
    let backend = Arc::new(MockBackend::new("", &["a", "b", "c"]));
    let ocr = Arc::new(MockOcr::failing_on(1));
    let err = extractor(backend, ocr, 1)
        .extract(b"%PDF-1.7".to_vec())
        .await
        .unwrap_err();

    match err {
        ExtractionError::Ocr { page, ref source } => {
            assert_eq!(page, 2);
            assert!(source.to_string().contains("unreadable scan"));
        }
        other => panic!("expected OCR error, got {other:?}"),
    }
}

#[tokio::test]
async fn document_without_pages_is_an_error() {
    let backend = Arc::new(MockBackend::new("", &[]));
    let ocr = Arc::new(MockOcr::new(0));
    let err = extractor(backend, ocr, 2)
        .extract(b"%PDF-1.7".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractionError::NoPages));
}

#[tokio::test]
async fn analyze_document_runs_full_pipeline() {
    let backend = Arc::new(MockBackend::new("", &["The quick fox.", "The fox jumps!"]));
    let ocr = Arc::new(MockOcr::new(2));
    let analyzer = DocumentAnalyzer::new(
        extractor(backend, ocr, 2),
        Analyzer::new(StopWords::default(), 20),
    );

    let report = analyzer
        .analyze_document(b"%PDF-1.7".to_vec())
        .await
        .unwrap();
    assert_eq!(report.stats.word_count, 6);
    assert_eq!(report.stats.sentence_count, 2);
    assert_eq!(report.word_frequency[0], WordCount("fox".into(), 2));
    assert!(report.word_frequency.iter().all(|w| w.word() != "the"));
}

#[tokio::test]
async fn blank_scan_yields_zero_stats() {
    let backend = Arc::new(MockBackend::new("", &[""]));
    let ocr = Arc::new(MockOcr::new(1));
    let analyzer = DocumentAnalyzer::new(extractor(backend, ocr, 1), Analyzer::default());

    let report = analyzer
        .analyze_document(b"%PDF-1.7".to_vec())
        .await
        .unwrap();
    assert_eq!(report.stats.word_count, 0);
    assert_eq!(report.stats.avg_word_length, 0.0);
    assert!(report.word_frequency.is_empty());
}

#[tokio::test]
async fn analyze_document_wraps_extraction_errors() {
    let backend = Arc::new(MockBackend::broken("not a PDF"));
    let ocr = Arc::new(MockOcr::new(0));
    let analyzer = DocumentAnalyzer::new(extractor(backend, ocr, 1), Analyzer::default());

    let err = analyzer
        .analyze_document(b"%PDF-1.7".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::Extraction(_)));
    assert!(!err.is_invalid_input());
    assert!(err.to_string().contains("not a PDF"));
}
