//! Question answering handler

use axum::extract::State;
use axum::{Form, Json};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use veridex_answer::QueryOutcome;
use veridex_common::errors::{AppError, Result};

/// Form fields accepted by the query endpoint
#[derive(Debug, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(max = 4096))]
    pub question: String,

    /// Return the retrieval projection instead of generating an answer
    #[serde(default)]
    pub debug: bool,

    /// Conversation id for the recall convenience reply
    pub session_id: Option<String>,
}

/// Answer a question against the indexed corpus.
#[instrument(skip_all)]
pub async fn query(
    State(state): State<AppState>,
    Form(request): Form<QueryRequest>,
) -> Result<Json<QueryOutcome>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;
    if request.question.trim().is_empty() {
        return Err(AppError::Validation {
            message: "Question must not be empty".to_string(),
            field: Some("question".to_string()),
        });
    }

    let outcome = state
        .engine
        .answer(
            &request.question,
            request.debug,
            request.session_id.as_deref(),
        )
        .await?;

    Ok(Json(outcome))
}
