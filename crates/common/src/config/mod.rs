//! Configuration management for Veridex services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::errors::AppError;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Corpus storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Database configuration (Postgres index backend)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Answer generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Session recall configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Email notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory uploaded documents are stored in and ingested from
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Index backend: postgres, memory
    #[serde(default = "default_index_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: openai, mock
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (mock provider; openai derives it from the model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Generation provider: groq, openai, mock
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    /// API key for the chat completion service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Chat model to use
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Number of chunks fetched from the index per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of deduplicated chunks included in the model prompt
    #[serde(default = "default_context_chunks")]
    pub context_chunks: usize,

    /// Minimum best-match score for a question to be answerable
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Excerpt length in characters for debug projections
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive windows in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Questions remembered per session for recall
    #[serde(default = "default_session_max_questions")]
    pub max_questions: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Enable email notifications for unanswerable questions
    #[serde(default)]
    pub enabled: bool,

    /// SMTP relay host
    pub smtp_host: Option<String>,

    /// SMTP relay port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username
    pub username: Option<String>,

    /// SMTP password
    pub password: Option<String>,

    /// Sender address
    pub from: Option<String>,

    /// Recipient address
    pub to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_corpus_dir() -> String { "data/corpus".to_string() }
fn default_max_upload_bytes() -> usize { 25 * 1024 * 1024 }
fn default_database_url() -> String { "postgres://localhost/veridex".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_index_backend() -> String { "postgres".to_string() }
fn default_embedding_provider() -> String { "openai".to_string() }
fn default_embedding_model() -> String { "text-embedding-ada-002".to_string() }
fn default_embedding_dimension() -> usize { 768 }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_generation_provider() -> String { "groq".to_string() }
fn default_generation_model() -> String { "llama3-70b-8192".to_string() }
fn default_generation_timeout() -> u64 { 30 }
fn default_top_k() -> usize { 7 }
fn default_context_chunks() -> usize { 3 }
fn default_min_score() -> f32 { 0.1 }
fn default_excerpt_chars() -> usize { 200 }
fn default_chunk_size() -> usize { 300 }
fn default_chunk_overlap() -> usize { 100 }
fn default_session_max_questions() -> usize { 20 }
fn default_smtp_port() -> u16 { 587 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "veridex".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check invariants that would otherwise surface mid-request.
    ///
    /// Broken pipeline arithmetic is fatal. Missing credentials only degrade
    /// the features that need them, so those log a warning instead.
    pub fn validate(&self) -> crate::errors::Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(AppError::Configuration {
                message: "chunking.chunk_size must be positive".to_string(),
            });
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Configuration {
                message: format!(
                    "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                    self.chunking.chunk_overlap, self.chunking.chunk_size
                ),
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::Configuration {
                message: "retrieval.top_k must be positive".to_string(),
            });
        }
        if self.retrieval.context_chunks == 0 {
            return Err(AppError::Configuration {
                message: "retrieval.context_chunks must be positive".to_string(),
            });
        }
        if !self.retrieval.min_score.is_finite() {
            return Err(AppError::Configuration {
                message: "retrieval.min_score must be a finite number".to_string(),
            });
        }
        if self.embedding.dimension == 0 {
            return Err(AppError::Configuration {
                message: "embedding.dimension must be positive".to_string(),
            });
        }
        match self.index.backend.as_str() {
            "postgres" | "memory" => {}
            other => {
                return Err(AppError::Configuration {
                    message: format!("unknown index.backend '{}'", other),
                });
            }
        }
        if self.generation.provider != "mock" && self.generation.api_key.is_none() {
            warn!("generation.api_key is not set; questions that reach the model will fail");
        }
        Ok(())
    }

    /// Get generation request timeout as Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { backend: default_index_backend() }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            api_key: None,
            api_base: None,
            model: default_generation_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            context_chunks: default_context_chunks(),
            min_score: default_min_score(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_questions: default_session_max_questions() }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
            to: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}
