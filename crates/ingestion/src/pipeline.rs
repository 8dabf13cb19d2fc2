//! Corpus ingestion pipeline
//!
//! Walks the corpus directory, loads PDF documents that are not yet
//! indexed, chunks and embeds them, and writes the results to the vector
//! index. Content hashes make the pass idempotent: a document is embedded
//! once no matter how often the pass runs or what the file is called.

use crate::chunker;
use crate::hasher;
use crate::pdf;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use veridex_common::config::ChunkingConfig;
use veridex_common::embeddings::Embedder;
use veridex_common::errors::Result;
use veridex_common::index::VectorIndex;
use veridex_common::metrics;
use veridex_common::models::{Chunk, ChunkMetadata};

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Chunks embedded and written to the index during this pass
    pub embedded_chunks: usize,

    /// Files embedded for the first time
    pub new_files: Vec<String>,

    /// Files whose content was already indexed
    pub skipped_files: Vec<String>,

    /// Files that could not be read or parsed
    pub failed_files: Vec<String>,
}

impl IngestReport {
    /// Human-readable summary used by the HTTP surface.
    pub fn message(&self) -> String {
        if self.embedded_chunks > 0 {
            format!("Embedded {} new chunks.", self.embedded_chunks)
        } else {
            "No new documents to embed.".to_string()
        }
    }
}

/// Ingestion pipeline over a corpus directory.
pub struct IngestionPipeline {
    corpus_dir: PathBuf,
    chunking: ChunkingConfig,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    // Serializes passes; concurrent callers queue instead of racing to
    // embed the same documents twice.
    pass_lock: Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(
        corpus_dir: impl Into<PathBuf>,
        chunking: ChunkingConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            chunking,
            embedder,
            index,
            pass_lock: Mutex::new(()),
        }
    }

    /// Embed every corpus document whose content is not yet indexed.
    ///
    /// Unreadable or unparseable files are reported and skipped; an
    /// embedding or index failure fails the whole pass and nothing is
    /// written.
    #[instrument(skip(self))]
    pub async fn embed_new_documents(&self) -> Result<IngestReport> {
        let _guard = self.pass_lock.lock().await;
        self.run_pass().await
    }

    /// Drop the index contents and re-embed the whole corpus.
    #[instrument(skip(self))]
    pub async fn reindex(&self) -> Result<IngestReport> {
        let _guard = self.pass_lock.lock().await;
        self.index.clear().await?;
        self.run_pass().await
    }

    async fn run_pass(&self) -> Result<IngestReport> {
        let start = Instant::now();
        std::fs::create_dir_all(&self.corpus_dir)?;

        let known_hashes = self.index.indexed_hashes().await?;
        let mut seen_this_pass: HashSet<String> = HashSet::new();
        let mut report = IngestReport::default();
        let mut batch: Vec<Chunk> = Vec::new();

        for path in self.pdf_paths()? {
            let name = file_name(&path);

            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to read document, skipping");
                    report.failed_files.push(name);
                    continue;
                }
            };

            let hash = hasher::content_hash(&bytes);
            if known_hashes.contains(&hash) || seen_this_pass.contains(&hash) {
                report.skipped_files.push(name);
                continue;
            }

            let pages = match pdf::extract_pages(&bytes, &name) {
                Ok(pages) => pages,
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to extract document, skipping");
                    report.failed_files.push(name);
                    continue;
                }
            };

            let chunks = build_chunks(&name, &hash, &pages, &self.chunking);
            info!(file = %name, chunks = chunks.len(), "Document loaded");
            batch.extend(chunks);
            report.new_files.push(name);
            seen_this_pass.insert(hash);
        }

        // One embedding call and one index write for the whole pass; a
        // failure here fails the pass, unlike per-file load errors.
        if !batch.is_empty() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            self.index.add(&batch, &embeddings).await?;
        }
        report.embedded_chunks = batch.len();

        metrics::record_ingestion(
            start.elapsed().as_secs_f64(),
            report.new_files.len(),
            report.embedded_chunks,
            report.failed_files.len(),
        );
        info!(
            new = report.new_files.len(),
            skipped = report.skipped_files.len(),
            failed = report.failed_files.len(),
            chunks = report.embedded_chunks,
            "Ingestion pass complete"
        );

        Ok(report)
    }

    /// PDF files in the corpus directory, sorted by name so in-batch
    /// duplicate resolution is deterministic.
    fn pdf_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.corpus_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_pdf = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if is_pdf {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_chunks(
    source: &str,
    hash: &str,
    pages: &[String],
    config: &ChunkingConfig,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for (page_index, page_text) in pages.iter().enumerate() {
        for window in chunker::chunk_text(page_text, config) {
            chunks.push(Chunk {
                text: window.text,
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    content_hash: hash.to_string(),
                    page: page_index as u32,
                    start_offset: window.start_offset,
                },
            });
        }
    }
    chunks
}
