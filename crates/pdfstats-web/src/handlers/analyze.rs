use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use pdfstats_core::{AnalysisReport, check_pdf_input};

use crate::models::ApiError;
use crate::state::AppState;
use crate::upload;

/// `POST /api/analyze`: multipart upload with the PDF in the `pdf` field.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, ApiError> {
    let file = upload::parse_multipart(multipart).await?;

    check_pdf_input(
        &file.data,
        file.content_type.as_deref(),
        state.max_upload_bytes,
    )?;

    tracing::info!(filename = %file.filename, bytes = file.data.len(), "analyzing upload");
    let report = state.analyzer.analyze_document(file.data).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pdfstats_core::{
        Analyzer, BackendError, DocumentAnalyzer, ExtractionConfig, Extractor, OcrEngine,
        OcrError, PageImage, PdfBackend,
    };
    use tower::ServiceExt;

    use crate::routes::router;
    use crate::state::AppState;

    const BOUNDARY: &str = "pdfstats-test-boundary";

    /// Backend that treats the whole upload as its embedded text layer.
    struct EchoBackend;

    impl PdfBackend for EchoBackend {
        fn extract_text(&self, data: &[u8]) -> Result<String, BackendError> {
            let text = String::from_utf8_lossy(data);
            if text.contains("BROKEN") {
                return Err(BackendError::OpenError("xref table damaged".into()));
            }
            Ok(text.trim_start_matches("%PDF-1.7").to_string())
        }

        fn render_pages(&self, _data: &[u8], _dpi: u32) -> Result<Vec<PageImage>, BackendError> {
            Ok(vec![PageImage {
                index: 0,
                width: 1,
                height: 1,
                png: b"scanned words scanned".to_vec(),
            }])
        }
    }

    struct EchoOcr;

    impl OcrEngine for EchoOcr {
        fn name(&self) -> &str {
            "echo"
        }

        fn recognize(&self, page: &PageImage) -> Result<String, OcrError> {
            Ok(String::from_utf8_lossy(&page.png).to_string())
        }
    }

    fn test_app(max_upload_bytes: usize) -> axum::Router {
        let extractor = Extractor::new(
            Arc::new(EchoBackend),
            Arc::new(EchoOcr),
            ExtractionConfig::default(),
        );
        router(Arc::new(AppState {
            analyzer: DocumentAnalyzer::new(extractor, Analyzer::default()),
            max_upload_bytes,
        }))
    }

    fn multipart_request(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"doc.pdf\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const TEXT_PDF: &[u8] = b"%PDF-1.7 The quick fox. The fox jumps! A sentence long enough to skip OCR.";

    #[tokio::test]
    async fn analyze_returns_stats_and_frequencies() {
        let response = test_app(1024)
            .oneshot(multipart_request("pdf", "application/pdf", TEXT_PDF))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["stats"]["sentenceCount"], 3);
        assert_eq!(json["wordFrequency"][0], serde_json::json!(["fox", 2]));
        assert!(json["stats"]["avgWordLength"].is_f64());
    }

    #[tokio::test]
    async fn short_text_layer_uses_ocr() {
        let response = test_app(1024)
            .oneshot(multipart_request("pdf", "application/pdf", b"%PDF-1.7 tiny"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["stats"]["wordCount"], 3);
        assert_eq!(json["wordFrequency"][0], serde_json::json!(["scanned", 2]));
    }

    #[tokio::test]
    async fn wrong_mime_type_is_bad_request() {
        let response = test_app(1024)
            .oneshot(multipart_request("pdf", "image/png", TEXT_PDF))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("image/png"));
    }

    #[tokio::test]
    async fn missing_file_field_is_bad_request() {
        let response = test_app(1024)
            .oneshot(multipart_request("document", "application/pdf", TEXT_PDF))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn oversized_file_is_bad_request() {
        let response = test_app(16)
            .oneshot(multipart_request("pdf", "application/pdf", TEXT_PDF))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn extraction_failure_is_server_error() {
        let response = test_app(1024)
            .oneshot(multipart_request(
                "pdf",
                "application/pdf",
                b"%PDF-1.7 BROKEN",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(
            json["error"]
                .as_str()
                .unwrap()
                .contains("xref table damaged")
        );
    }

    #[tokio::test]
    async fn unbounded_upload_limit_still_serves() {
        let response = test_app(usize::MAX)
            .oneshot(multipart_request("pdf", "application/pdf", TEXT_PDF))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = test_app(1024)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }
}
