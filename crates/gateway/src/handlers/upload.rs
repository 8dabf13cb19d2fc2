//! Document upload handler

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::AppState;
use veridex_common::errors::{AppError, Result};

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub destination: String,
}

/// Store an uploaded document into the corpus directory.
///
/// The first multipart part carrying a filename is taken as the document;
/// its bytes are written unchanged. Indexing happens later via
/// `POST /embed_new`.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFormat {
            message: format!("Malformed multipart request: {}", e),
        })?
    {
        let Some(filename) = field.file_name().map(sanitize_filename) else {
            continue;
        };
        if filename.is_empty() {
            return Err(AppError::Validation {
                message: "Uploaded file has no usable name".to_string(),
                field: Some("file".to_string()),
            });
        }

        let bytes = field.bytes().await.map_err(|e| AppError::InvalidFormat {
            message: format!("Failed to read upload: {}", e),
        })?;
        if bytes.is_empty() {
            return Err(AppError::Validation {
                message: "Uploaded file is empty".to_string(),
                field: Some("file".to_string()),
            });
        }

        let limit = state.config.storage.max_upload_bytes;
        if bytes.len() > limit {
            return Err(AppError::PayloadTooLarge {
                size: bytes.len(),
                limit,
            });
        }

        let corpus_dir = Path::new(&state.config.storage.corpus_dir);
        tokio::fs::create_dir_all(corpus_dir).await?;
        let destination = corpus_dir.join(&filename);
        tokio::fs::write(&destination, &bytes).await?;

        info!(file = %filename, bytes = bytes.len(), "Document uploaded");

        return Ok(Json(UploadResponse {
            message: format!("{} saved to {}", filename, state.config.storage.corpus_dir),
            filename,
            destination: destination.display().to_string(),
        }));
    }

    Err(AppError::MissingField {
        field: "file".to_string(),
    })
}

/// Strip path separators and parent-directory components from a client
/// filename.
fn sanitize_filename(name: &str) -> String {
    let name = name.replace('/', "").replace('\\', "").replace("..", "");

    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}
