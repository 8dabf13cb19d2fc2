//! Veridex Common Library
//!
//! Shared code for all Veridex services including:
//! - Chunk and metadata models
//! - Vector index abstraction (Postgres/pgvector and in-memory backends)
//! - Embedding client abstraction
//! - Error types and handling
//! - Configuration management
//! - Email notifications
//! - Metrics and observability

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod metrics;
pub mod models;
pub mod notify;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use index::VectorIndex;
pub use models::{Chunk, ChunkMetadata, ScoredChunk};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
