//! Answer engine
//!
//! Orchestrates one query end to end: canned shortcuts, session recall,
//! retrieval, the sufficiency threshold, prompt construction, and the
//! external generation call. Matching runs on the normalized question;
//! embedding and prompts always use the raw question.

use crate::canned;
use crate::generator::Generator;
use crate::prompt;
use crate::session::SessionStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use veridex_common::errors::Result;
use veridex_common::metrics;
use veridex_common::notify::Notifier;
use veridex_retrieval::{RetrievalRanker, RetrievedItem};

/// Reply when retrieval cannot ground an answer.
pub const INSUFFICIENT_ANSWER: &str =
    "The provided documents do not contain sufficient information to answer this question.";

/// Result of one query, serialized as-is by the HTTP surface.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    /// Debug mode: the deduplicated retrieval projection, no generation.
    Debug { retrieved: Vec<RetrievedItem> },

    /// Best score below threshold: fixed answer plus what was retrieved.
    Insufficient {
        answer: String,
        retrieved: Vec<RetrievedItem>,
    },

    /// Generated or canned answer. Canned replies carry no sources.
    Answered {
        answer: String,
        sources: Vec<String>,
    },
}

/// Query orchestrator.
pub struct AnswerEngine {
    ranker: RetrievalRanker,
    generator: Arc<dyn Generator>,
    sessions: SessionStore,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AnswerEngine {
    pub fn new(
        ranker: RetrievalRanker,
        generator: Arc<dyn Generator>,
        sessions: SessionStore,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            ranker,
            generator,
            sessions,
            notifier,
        }
    }

    /// Answer a question.
    ///
    /// Canned shortcuts (recall, greetings, dialect phrases) resolve before
    /// any retrieval work and before the question is logged to the session.
    #[instrument(skip(self, question, debug))]
    pub async fn answer(
        &self,
        question: &str,
        debug: bool,
        session_id: Option<&str>,
    ) -> Result<QueryOutcome> {
        let start = Instant::now();
        let normalized = canned::normalize(question);

        if canned::is_recall_request(&normalized) {
            let outcome = self.recall_reply(session_id).await;
            metrics::record_query(start.elapsed().as_secs_f64(), "recall");
            return Ok(outcome);
        }

        if let Some(reply) =
            canned::greeting_reply(&normalized).or_else(|| canned::dialect_reply(&normalized))
        {
            metrics::record_query(start.elapsed().as_secs_f64(), "canned");
            return Ok(QueryOutcome::Answered {
                answer: reply.to_string(),
                sources: Vec::new(),
            });
        }

        if let Some(id) = session_id {
            self.sessions.log(id, &normalized).await;
        }

        let results = self.ranker.retrieve(question).await?;

        if debug {
            let retrieved = self.ranker.project(&results);
            metrics::record_query(start.elapsed().as_secs_f64(), "debug");
            return Ok(QueryOutcome::Debug { retrieved });
        }

        if !self.ranker.is_sufficient(&results) {
            let retrieved = self.ranker.project(&results);
            self.spawn_notification(question, results.first().map(|r| r.score));
            metrics::record_query(start.elapsed().as_secs_f64(), "insufficient");
            return Ok(QueryOutcome::Insufficient {
                answer: INSUFFICIENT_ANSWER.to_string(),
                retrieved,
            });
        }

        let context = self.ranker.select_context(&results);
        let prompt = prompt::build_prompt(context, question);
        let answer = self.generator.generate(&prompt).await?;
        let sources = context
            .iter()
            .map(|r| r.chunk.metadata.source.clone())
            .collect();

        metrics::record_query(start.elapsed().as_secs_f64(), "answered");
        Ok(QueryOutcome::Answered { answer, sources })
    }

    async fn recall_reply(&self, session_id: Option<&str>) -> QueryOutcome {
        let history = match session_id {
            Some(id) => self.sessions.recent(id).await,
            None => Vec::new(),
        };

        let answer = if history.is_empty() {
            "You haven't asked anything yet.".to_string()
        } else {
            let lines: Vec<String> = history.iter().map(|q| format!("- {}", q)).collect();
            format!("You previously asked:\n{}", lines.join("\n"))
        };

        QueryOutcome::Answered {
            answer,
            sources: Vec::new(),
        }
    }

    /// Fire one notification attempt without blocking or failing the reply.
    fn spawn_notification(&self, question: &str, best_score: Option<f32>) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let question = question.to_string();
        tokio::spawn(async move {
            match notifier.notify_insufficient(&question, best_score).await {
                Ok(()) => metrics::record_notification(true),
                Err(e) => {
                    tracing::warn!(error = %e, "Notification attempt failed");
                    metrics::record_notification(false);
                }
            }
        });
    }
}
