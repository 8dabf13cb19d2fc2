//! Retrieval ranking
//!
//! Turns a question into ranked supporting chunks: embed the question,
//! pull the nearest neighbours from the index, drop duplicate texts, and
//! decide whether the best match clears the relevance threshold.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use veridex_common::config::RetrievalConfig;
use veridex_common::embeddings::Embedder;
use veridex_common::errors::Result;
use veridex_common::index::VectorIndex;
use veridex_common::metrics;
use veridex_common::models::ScoredChunk;

/// Compact view of a retrieved chunk for debug output
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedItem {
    pub source: String,
    pub score: f32,
    pub excerpt: String,
}

/// Ranks index contents against questions.
pub struct RetrievalRanker {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl RetrievalRanker {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Embed the question and fetch the `top_k` nearest chunks, best
    /// first, with duplicate texts removed. The first occurrence of a
    /// duplicate (the highest-scoring one) wins.
    #[instrument(skip(self, question))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        let start = Instant::now();

        let embedding = self.embedder.embed(question).await?;
        let results = self.index.search(&embedding, self.config.top_k).await?;
        let deduplicated = dedup_by_text(results);

        metrics::record_retrieval(start.elapsed().as_secs_f64(), deduplicated.len());
        Ok(deduplicated)
    }

    /// Whether the best match clears the relevance threshold.
    ///
    /// The comparison is inclusive: a best score exactly at `min_score`
    /// counts as sufficient. No results means insufficient.
    pub fn is_sufficient(&self, results: &[ScoredChunk]) -> bool {
        results
            .first()
            .map(|best| best.score >= self.config.min_score)
            .unwrap_or(false)
    }

    /// The leading slice of results that goes into the model prompt.
    pub fn select_context<'a>(&self, results: &'a [ScoredChunk]) -> &'a [ScoredChunk] {
        &results[..results.len().min(self.config.context_chunks)]
    }

    /// Project results into the debug shape: source, score, excerpt.
    ///
    /// Scores are rounded to three decimals. Excerpts are the leading
    /// characters of the chunk with newlines flattened to spaces.
    pub fn project(&self, results: &[ScoredChunk]) -> Vec<RetrievedItem> {
        results
            .iter()
            .map(|r| RetrievedItem {
                source: r.chunk.metadata.source.clone(),
                score: (r.score * 1000.0).round() / 1000.0,
                excerpt: excerpt(&r.chunk.text, self.config.excerpt_chars),
            })
            .collect()
    }
}

/// Drop chunks whose trimmed text already appeared earlier in the list.
fn dedup_by_text(results: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    let mut seen: HashSet<String> = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.chunk.text.trim().to_string()))
        .collect()
}

/// First `max_chars` characters of the text, newlines flattened to spaces.
fn excerpt(text: &str, max_chars: usize) -> String {
    text.replace('\n', " ").chars().take(max_chars).collect()
}
