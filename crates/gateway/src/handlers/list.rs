//! Indexed corpus listing handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::AppState;
use veridex_common::errors::Result;

#[derive(Serialize)]
pub struct ListIndexedResponse {
    pub indexed_files: Vec<String>,
}

/// Sorted distinct source filenames currently in the index.
#[instrument(skip_all)]
pub async fn list_indexed(State(state): State<AppState>) -> Result<Json<ListIndexedResponse>> {
    let indexed_files = state.index.indexed_sources().await?;
    Ok(Json(ListIndexedResponse { indexed_files }))
}
