//! Chat generation abstraction
//!
//! Providers speak the OpenAI chat-completions protocol; Groq hosts the
//! default model. A missing credential is reported at call time so the
//! service can start (and serve canned replies) without one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use veridex_common::config::GenerationConfig;
use veridex_common::errors::{AppError, Result};
use veridex_common::metrics;

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Trait for answer generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer for a fully built prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct ChatGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Deserialize)]
struct ChatMessageBody {
    content: String,
}

impl ChatGenerator {
    /// Create a new chat generator.
    ///
    /// The API key may be absent; `generate` fails with a configuration
    /// error before making any network call in that case.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let base_url = config.api_base.clone().unwrap_or_else(|| {
            match config.provider.as_str() {
                "openai" => OPENAI_API_BASE.to_string(),
                _ => GROQ_API_BASE.to_string(),
            }
        });

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            timeout,
        })
    }

    async fn make_request(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::GenerationTimeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    AppError::GenerationError {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GenerationError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse =
            response.json().await.map_err(|e| AppError::GenerationError {
                message: format!("Failed to parse response: {}", e),
            })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::GenerationError {
                message: "Empty response".to_string(),
            })
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration {
                message: "generation.api_key is not set".to_string(),
            })?;

        let start = Instant::now();
        let result = self.make_request(api_key, prompt).await;
        metrics::record_generation(start.elapsed().as_secs_f64(), &self.model, result.is_ok());
        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Generator that echoes its prompt, for tests and offline development.
pub struct MockGenerator;

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(prompt.to_string())
    }

    fn model_name(&self) -> &str {
        "mock-generation"
    }
}

/// Create a generator based on configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "groq" | "openai" => Ok(Arc::new(ChatGenerator::new(config)?)),
        "mock" => Ok(Arc::new(MockGenerator)),
        other => {
            tracing::warn!(provider = other, "Unknown generation provider, using mock");
            Ok(Arc::new(MockGenerator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generator_echoes_prompt() {
        let generator = MockGenerator;
        let answer = generator.generate("some prompt").await.unwrap();
        assert_eq!(answer, "some prompt");
        assert_eq!(generator.model_name(), "mock-generation");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_network_call() {
        let config = GenerationConfig::default();
        assert!(config.api_key.is_none());

        let generator = ChatGenerator::new(&config).unwrap();
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_create_generator_defaults_to_chat() {
        let config = GenerationConfig::default();
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.model_name(), "llama3-70b-8192");
    }

    #[test]
    fn test_create_generator_unknown_provider_uses_mock() {
        let config = GenerationConfig {
            provider: "something-else".to_string(),
            ..GenerationConfig::default()
        };
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.model_name(), "mock-generation");
    }
}
