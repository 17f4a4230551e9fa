//! Ollama model backend
//!
//! Implements `ModelBackend` on top of a local Ollama server, typically at
//! http://localhost:11434.
//!
//! - Generation: `POST /api/generate` (non-streaming, `num_predict` bounds
//!   the output)
//! - Embeddings: `POST /api/embeddings`
//! - Health: `GET /api/tags`
//!
//! Generation and embedding use separate models. `reqwest::Client` is
//! connection-pooled and safe to share, so one backend serves every session.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationOptions, LLMError, ModelBackend, Result};

/// Ollama backend configuration
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    /// Base URL for Ollama API (typically http://localhost:11434)
    base_url: String,

    /// Model used for question generation (e.g., "llama3.1:8b")
    generation_model: String,

    /// Model used for embeddings (e.g., "all-minilm")
    embedding_model: String,

    /// HTTP client for API requests
    client: Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Arguments
    /// * `base_url` - Base URL for Ollama API (e.g., "http://localhost:11434")
    /// * `generation_model` - Model name for question generation
    /// * `embedding_model` - Model name for answer embeddings
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        base_url: impl Into<String>,
        generation_model: impl Into<String>,
        embedding_model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            generation_model: generation_model.into(),
            embedding_model: embedding_model.into(),
            client,
        }
    }

    /// Model used for question generation
    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }

    /// Model used for embeddings
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn map_send_error(&self, e: reqwest::Error) -> LLMError {
        if e.is_timeout() {
            LLMError::Timeout
        } else if e.is_connect() {
            LLMError::ProviderUnavailable(format!(
                "Cannot connect to Ollama at {}. Is Ollama running?",
                self.base_url
            ))
        } else {
            LLMError::NetworkError(e.to_string())
        }
    }

    /// POST `body` to `path` and decode the JSON reply
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        tracing::debug!(
            "Ollama {} answered in {:.2}s",
            path,
            start.elapsed().as_secs_f64()
        );

        // Check response status
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(if status.is_client_error() {
                LLMError::InvalidRequest(format!("Ollama API error ({}): {}", status, error_text))
            } else {
                LLMError::ProviderUnavailable(format!(
                    "Ollama API error ({}): {}",
                    status, error_text
                ))
            });
        }

        response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        tracing::debug!(
            "Ollama generate: model={}, prompt_chars={}, num_predict={}",
            self.generation_model,
            prompt.len(),
            options.max_output_tokens
        );

        let request = GenerateRequest {
            model: &self.generation_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: options.max_output_tokens,
                temperature: options.temperature,
            },
        };

        let response: GenerateResponse = self.post("/api/generate", &request).await?;
        Ok(response.response)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response: EmbeddingResponse = self.post("/api/embeddings", &request).await?;

        if response.embedding.is_empty() {
            return Err(LLMError::ParseError(format!(
                "Ollama returned an empty embedding for model {}",
                self.embedding_model
            )));
        }

        Ok(response.embedding)
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}

/// Ollama generate request format
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// Ollama model options
#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

/// Ollama generate response format
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

/// Ollama embeddings request format
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Ollama embeddings response format
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}
