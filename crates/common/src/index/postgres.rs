//! Postgres + pgvector index backend

use super::VectorIndex;
use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use crate::models::{Chunk, ChunkMetadata, ScoredChunk};
use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

/// Vector index backed by Postgres with the pgvector extension.
///
/// Cosine distance (`<=>`) drives ordering; reported scores are
/// `1 - distance` so that higher means more relevant, matching the
/// in-memory backend.
pub struct PgVectorIndex {
    pool: PgPool,
}

impl PgVectorIndex {
    /// Connect to the database and prepare the schema.
    pub async fn connect(config: &DatabaseConfig, dimension: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| AppError::IndexUnavailable {
                message: format!("Failed to connect to Postgres: {}", e),
            })?;

        let index = Self { pool };
        index.migrate(dimension).await?;
        Ok(index)
    }

    async fn migrate(&self, dimension: usize) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id UUID PRIMARY KEY,
                source TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                page INTEGER NOT NULL,
                start_offset BIGINT NOT NULL,
                content TEXT NOT NULL,
                embedding vector({}),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            dimension
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chunks_content_hash ON chunks (content_hash)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks (source)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
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

        let mut tx = self.pool.begin().await?;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, content_hash, page, start_offset, content, embedding)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&chunk.metadata.source)
            .bind(&chunk.metadata.content_hash)
            .bind(chunk.metadata.page as i32)
            .bind(chunk.metadata.start_offset as i64)
            .bind(&chunk.text)
            .bind(Vector::from(embedding.clone()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = Vector::from(embedding.to_vec());

        let rows = sqlx::query(
            r#"
            SELECT source, content_hash, page, start_offset, content,
                   1 - (embedding <=> $1) AS score
            FROM chunks
            WHERE embedding IS NOT NULL
            ORDER BY embedding <=> $1
            LIMIT $2
            "#,
        )
        .bind(&query_vec)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let score: f64 = row.try_get("score")?;
            results.push(ScoredChunk {
                chunk: Chunk {
                    text: row.try_get("content")?,
                    metadata: ChunkMetadata {
                        source: row.try_get("source")?,
                        content_hash: row.try_get("content_hash")?,
                        page: row.try_get::<i32, _>("page")? as u32,
                        start_offset: row.try_get::<i64, _>("start_offset")? as usize,
                    },
                },
                score: score as f32,
            });
        }
        Ok(results)
    }

    async fn indexed_hashes(&self) -> Result<HashSet<String>> {
        let hashes: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT content_hash FROM chunks")
                .fetch_all(&self.pool)
                .await?;
        Ok(hashes.into_iter().collect())
    }

    async fn indexed_sources(&self) -> Result<Vec<String>> {
        let sources: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT source FROM chunks ORDER BY source")
                .fetch_all(&self.pool)
                .await?;
        Ok(sources)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("TRUNCATE chunks").execute(&self.pool).await?;
        Ok(())
    }
}
