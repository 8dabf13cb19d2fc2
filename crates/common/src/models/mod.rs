//! Core data types shared across Veridex services

use serde::{Deserialize, Serialize};

/// Metadata attached to every chunk at ingestion time and preserved
/// unchanged through indexing and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File name of the originating document
    pub source: String,

    /// Hex-encoded content hash of the originating document bytes
    pub content_hash: String,

    /// Zero-based page number the chunk was extracted from
    pub page: u32,

    /// Character offset of the chunk within its page text
    pub start_offset: usize,
}

/// A contiguous piece of extracted document text plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A chunk returned from the index together with its relevance score.
///
/// Scores are cosine similarity against the query embedding; higher is
/// more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
