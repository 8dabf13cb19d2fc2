//! Veridex Reindex Tool
//!
//! Clears the vector index and re-embeds every document in the corpus
//! directory. Run after changing chunking or embedding settings.

use tracing::{info, Level};
use veridex_common::{config::AppConfig, embeddings, index, VERSION};
use veridex_ingestion::IngestionPipeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting Veridex reindex v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;
    config.validate()?;

    let embedder = embeddings::create_embedder(&config.embedding)?;
    let index = index::create_index(&config, embedder.dimension()).await?;

    let pipeline = IngestionPipeline::new(
        &config.storage.corpus_dir,
        config.chunking.clone(),
        embedder,
        index,
    );

    let report = pipeline.reindex().await?;
    info!(
        new = report.new_files.len(),
        failed = report.failed_files.len(),
        chunks = report.embedded_chunks,
        "Reindex complete"
    );

    Ok(())
}
