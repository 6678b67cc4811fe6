use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use crate::models::ApiError;

/// An uploaded file with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    /// MIME type declared by the client for the file part.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Pull the `pdf` file field out of a multipart upload.
///
/// Other fields are read and discarded.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read form field", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdf" => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e))?
                    .to_vec();

                file = Some(UploadedFile {
                    filename,
                    content_type,
                    data,
                });
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    file.ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "No file uploaded"))
}

/// Keep axum's status (e.g. 413 when the body limit is hit) alongside our message.
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    ApiError::new(err.status(), format!("{}: {}", context, err.body_text()))
}
