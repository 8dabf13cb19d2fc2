//! Vector index abstraction
//!
//! A [`VectorIndex`] stores embedded chunks and serves nearest-neighbour
//! queries by cosine similarity. Two backends are provided:
//! - [`PgVectorIndex`]: Postgres with the pgvector extension
//! - [`MemoryIndex`]: in-process, for tests and single-node deployments

pub mod memory;
pub mod postgres;

pub use memory::MemoryIndex;
pub use postgres::PgVectorIndex;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{Chunk, ScoredChunk};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Storage backend for embedded chunks
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Persist chunks with their embeddings.
    ///
    /// `chunks` and `embeddings` must have equal length; entries correspond
    /// by position.
    async fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Return the `limit` nearest chunks by cosine similarity, best first.
    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>>;

    /// Content hashes of every indexed document.
    async fn indexed_hashes(&self) -> Result<HashSet<String>>;

    /// Distinct source file names, sorted ascending.
    async fn indexed_sources(&self) -> Result<Vec<String>>;

    /// Number of chunks in the index.
    async fn count(&self) -> Result<u64>;

    /// Remove everything from the index.
    async fn clear(&self) -> Result<()>;
}

/// Create a vector index based on configuration
pub async fn create_index(config: &AppConfig, dimension: usize) -> Result<Arc<dyn VectorIndex>> {
    match config.index.backend.as_str() {
        "postgres" => Ok(Arc::new(
            PgVectorIndex::connect(&config.database, dimension).await?,
        )),
        "memory" => Ok(Arc::new(MemoryIndex::new())),
        other => Err(AppError::Configuration {
            message: format!("unknown index.backend '{}'", other),
        }),
    }
}
