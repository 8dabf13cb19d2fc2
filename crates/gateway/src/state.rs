//! Shared application state and composition root
//!
//! All trait objects (embedder, index, generator, notifier) are
//! constructed here once and injected into the services; nothing in the
//! request path builds its own collaborators.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use veridex_answer::{create_generator, AnswerEngine, Generator, SessionStore};
use veridex_common::config::AppConfig;
use veridex_common::embeddings::{create_embedder, Embedder};
use veridex_common::errors::Result;
use veridex_common::index::{create_index, VectorIndex};
use veridex_common::notify::{EmailNotifier, Notifier};
use veridex_ingestion::IngestionPipeline;
use veridex_retrieval::RetrievalRanker;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub index: Arc<dyn VectorIndex>,
    pub pipeline: Arc<IngestionPipeline>,
    pub engine: Arc<AnswerEngine>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Build the production state from configuration.
    pub async fn from_config(config: AppConfig, metrics: PrometheusHandle) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let index = create_index(&config, embedder.dimension()).await?;
        let generator = create_generator(&config.generation)?;
        let notifier =
            EmailNotifier::from_config(&config.notify).map(|n| Arc::new(n) as Arc<dyn Notifier>);

        Ok(Self::assemble(
            config, embedder, index, generator, notifier, metrics,
        ))
    }

    /// Wire the services from explicit collaborators.
    pub fn assemble(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        notifier: Option<Arc<dyn Notifier>>,
        metrics: PrometheusHandle,
    ) -> Self {
        let config = Arc::new(config);

        let pipeline = Arc::new(IngestionPipeline::new(
            &config.storage.corpus_dir,
            config.chunking.clone(),
            embedder.clone(),
            index.clone(),
        ));

        let ranker = RetrievalRanker::new(index.clone(), embedder, config.retrieval.clone());
        let engine = Arc::new(AnswerEngine::new(
            ranker,
            generator,
            SessionStore::new(config.session.max_questions),
            notifier,
        ));

        Self {
            config,
            index,
            pipeline,
            engine,
            metrics,
        }
    }
}
