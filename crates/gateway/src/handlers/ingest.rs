//! Corpus ingestion handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::AppState;
use veridex_common::errors::Result;
use veridex_ingestion::IngestReport;

#[derive(Serialize)]
pub struct EmbedNewResponse {
    pub message: String,
    pub embedded_chunks: usize,
    pub new_files: Vec<String>,
    pub skipped_files: Vec<String>,
    pub failed_files: Vec<String>,
}

impl From<IngestReport> for EmbedNewResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            message: report.message(),
            embedded_chunks: report.embedded_chunks,
            new_files: report.new_files,
            skipped_files: report.skipped_files,
            failed_files: report.failed_files,
        }
    }
}

/// Embed every corpus document that is not yet indexed.
#[instrument(skip_all)]
pub async fn embed_new(State(state): State<AppState>) -> Result<Json<EmbedNewResponse>> {
    let report = state.pipeline.embed_new_documents().await?;
    Ok(Json(report.into()))
}
