//! In-process vector index

use super::VectorIndex;
use crate::errors::{AppError, Result};
use crate::models::{Chunk, ScoredChunk};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tokio::sync::RwLock;

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Vector index held entirely in memory.
///
/// Search is a linear scan over all entries. That is fine for test corpora
/// and small single-node deployments; larger installs use the Postgres
/// backend.
#[derive(Default)]
pub struct MemoryIndex {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Internal {
                message: format!(
                    "chunk/embedding count mismatch: {} vs {}",
                    chunks.len(),
                    embeddings.len()
                ),
            });
        }

        let mut entries = self.entries.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            entries.push(Entry {
                chunk: chunk.clone(),
                embedding: embedding.clone(),
            });
        }
        Ok(())
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read().await;

        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(embedding, &entry.embedding),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn indexed_hashes(&self) -> Result<HashSet<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .map(|e| e.chunk.metadata.content_hash.clone())
            .collect())
    }

    async fn indexed_sources(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        let sources: BTreeSet<String> = entries
            .iter()
            .map(|e| e.chunk.metadata.source.clone())
            .collect();
        Ok(sources.into_iter().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.read().await.len() as u64)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn chunk(text: &str, source: &str, hash: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                content_hash: hash.to_string(),
                page: 0,
                start_offset: 0,
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[0.6, 0.8]) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let index = MemoryIndex::new();
        index
            .add(
                &[
                    chunk("far", "a.pdf", "h1"),
                    chunk("near", "a.pdf", "h1"),
                    chunk("middle", "a.pdf", "h1"),
                ],
                &[
                    vec![0.0, 1.0],
                    vec![1.0, 0.0],
                    vec![0.6, 0.8],
                ],
            )
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 10).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle", "far"]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let index = MemoryIndex::new();
        index
            .add(
                &[chunk("a", "a.pdf", "h1"), chunk("b", "a.pdf", "h1")],
                &[vec![1.0, 0.0], vec![0.9, 0.1]],
            )
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "a");
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let index = MemoryIndex::new();
        index
            .add(
                &[chunk("first", "a.pdf", "h1"), chunk("second", "a.pdf", "h1")],
                &[vec![1.0, 0.0], vec![1.0, 0.0]],
            )
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results[0].chunk.text, "first");
        assert_eq!(results[1].chunk.text, "second");
    }

    #[tokio::test]
    async fn test_metadata_round_trip() {
        let index = MemoryIndex::new();
        let original = Chunk {
            text: "refund policy text".to_string(),
            metadata: ChunkMetadata {
                source: "handbook.pdf".to_string(),
                content_hash: "abc123".to_string(),
                page: 4,
                start_offset: 200,
            },
        };
        index.add(&[original.clone()], &[vec![1.0, 0.0]]).await.unwrap();

        let results = index.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].chunk, original);
    }

    #[tokio::test]
    async fn test_indexed_sources_sorted_and_deduplicated() {
        let index = MemoryIndex::new();
        index
            .add(
                &[
                    chunk("x", "b.pdf", "h2"),
                    chunk("y", "a.pdf", "h1"),
                    chunk("z", "b.pdf", "h2"),
                ],
                &[vec![1.0], vec![1.0], vec![1.0]],
            )
            .await
            .unwrap();

        assert_eq!(index.indexed_sources().await.unwrap(), vec!["a.pdf", "b.pdf"]);
        let hashes = index.indexed_hashes().await.unwrap();
        assert_eq!(hashes.len(), 2);
        assert!(hashes.contains("h1"));
    }

    #[tokio::test]
    async fn test_count_and_clear() {
        let index = MemoryIndex::new();
        index
            .add(&[chunk("a", "a.pdf", "h1")], &[vec![1.0]])
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 1);

        index.clear().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.search(&[1.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_length_mismatch() {
        let index = MemoryIndex::new();
        let result = index.add(&[chunk("a", "a.pdf", "h1")], &[]).await;
        assert!(result.is_err());
    }
}
