//! Model backend abstraction layer
//!
//! Question generation and answer scoring run on pretrained models that the
//! quiz server treats as black boxes. The `ModelBackend` trait is the narrow
//! capability the rest of the engine sees: text in, text or an embedding out.
//! The Ollama implementation talks to a local model server over HTTP; tests
//! substitute a deterministic fake.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod ollama;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while calling a model backend
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Fixed generation parameters
///
/// These come from configuration and are never exposed to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 100,
            temperature: 0.2,
        }
    }
}

/// Capability interface over the generation and embedding models
///
/// Implementations are shared by every session and must tolerate concurrent
/// calls. Wrap a backend that cannot in `SerializedBackend`.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Returns the name of the backend (e.g., "ollama")
    fn name(&self) -> &str;

    /// Generate text for `prompt`, bounded by `options.max_output_tokens`
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Embed `text` into a dense vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Check if the backend is currently reachable
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Routes every call through one process-wide lock
///
/// For model runtimes that are not safe to call concurrently. Calls from all
/// sessions queue on the lock, so throughput drops to one call at a time.
pub struct SerializedBackend {
    inner: Arc<dyn ModelBackend>,
    lock: Mutex<()>,
}

impl SerializedBackend {
    pub fn new(inner: Arc<dyn ModelBackend>) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ModelBackend for SerializedBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let _guard = self.lock.lock().await;
        self.inner.generate(prompt, options).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let _guard = self.lock.lock().await;
        self.inner.embed(text).await
    }

    async fn check_health(&self) -> bool {
        self.inner.check_health().await
    }
}
