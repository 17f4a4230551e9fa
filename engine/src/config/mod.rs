//! Configuration management
//!
//! This module handles loading, validation, and management of the quiz
//! server configuration. Configuration is stored in TOML format at
//! ~/.quizd/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **server**: Bind host and port
//! - **model**: Ollama endpoint, model names, generation limits, timeouts
//! - **extraction**: Characters kept per page
//! - **documents**: Topic → reference PDF path
//!
//! # Path Expansion
//!
//! Document paths support `~` for the user's home directory. Paths are only
//! checked against the filesystem by `validate_documents`, which the server
//! runs before accepting sessions.
//!
//! # Examples
//!
//! ```no_run
//! use quiz_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Listening on {}", config.bind_address());
//! println!("Generation model: {}", config.model.generation_model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::extractor;
use crate::llm::GenerationOptions;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// HTTP / WebSocket listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Model backend settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Page text extraction
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Reference document per topic (supports ~ expansion)
    ///
    /// A missing section means the default paths under ~/quiz; a present
    /// section replaces them entirely.
    #[serde(default = "default_documents")]
    pub documents: BTreeMap<String, PathBuf>,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host or IP to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL for the Ollama API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used to generate questions
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Model used to embed answers and contexts
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Upper bound on generated tokens per question
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Context characters included in the generation prompt
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Timeout for each extraction or model call (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Route all model calls through one process-wide lock
    #[serde(default)]
    pub serialize_calls: bool,
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Characters kept from the start of a page
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,
}

/// Outcome of checking one topic's reference document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub topic: String,
    pub path: PathBuf,
    pub pages: usize,
    pub max_page_used: u32,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_generation_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_max_output_tokens() -> u32 {
    100
}

fn default_max_prompt_chars() -> usize {
    2048
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_char_limit() -> usize {
    extractor::DEFAULT_CHAR_LIMIT
}

fn default_documents() -> BTreeMap<String, PathBuf> {
    let mut documents = BTreeMap::new();
    documents.insert(
        "AI".to_string(),
        PathBuf::from("~/quiz/Student-Guide-Module-1-Fundamentals-of-AI.pdf"),
    );
    documents.insert(
        "ML".to_string(),
        PathBuf::from("~/quiz/Student-Guide-Module-2-Machine-Learning.pdf"),
    );
    documents
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            max_output_tokens: default_max_output_tokens(),
            max_prompt_chars: default_max_prompt_chars(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            serialize_calls: false,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            char_limit: default_char_limit(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.quizd/config.toml)
    ///
    /// If the configuration file doesn't exist, writes a default one.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();

        // Written before ~ expansion so the file stays portable
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Wrote default configuration to {}", path.display());

        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.quizd/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".quizd").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            extraction: ExtractionConfig::default(),
            documents: default_documents(),
        }
    }

    /// Validate values and expand ~ in document paths
    ///
    /// Does not touch the filesystem; see `validate_documents`.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.server.port == 0 {
            return Err(EngineError::Config("server.port must be non-zero".to_string()));
        }

        if self.extraction.char_limit == 0 {
            return Err(EngineError::Config(
                "extraction.char_limit must be greater than 0".to_string(),
            ));
        }

        if self.model.max_output_tokens == 0 {
            return Err(EngineError::Config(
                "model.max_output_tokens must be greater than 0".to_string(),
            ));
        }

        if self.model.max_prompt_chars == 0 {
            return Err(EngineError::Config(
                "model.max_prompt_chars must be greater than 0".to_string(),
            ));
        }

        if self.model.timeout_secs == 0 {
            return Err(EngineError::Config(
                "model.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(EngineError::Config(
                "model.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        for path in self.documents.values_mut() {
            *path = expand_path(path)?;
        }

        Ok(())
    }

    /// Check every catalog topic against its reference document
    ///
    /// Each topic needs a configured document that exists, parses as a PDF,
    /// and has at least as many pages as the highest page the catalog uses.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Document` for the first topic that fails.
    pub fn validate_documents(
        &self,
        catalog: &Catalog,
    ) -> Result<Vec<DocumentReport>, EngineError> {
        let mut reports = Vec::new();

        for topic in catalog.topics() {
            let document_error = |reason: String| EngineError::Document {
                topic: topic.name.clone(),
                reason,
            };

            let path = self
                .documents
                .get(&topic.name)
                .ok_or_else(|| document_error("no document configured".to_string()))?;

            if !path.is_file() {
                return Err(document_error(format!("{} is not a file", path.display())));
            }

            let pages = extractor::page_count(path).map_err(|e| document_error(e.to_string()))?;
            let max_page_used = topic.max_page().unwrap_or(0);

            if max_page_used as usize > pages {
                return Err(document_error(format!(
                    "{} has {} pages but the catalog references page {}",
                    path.display(),
                    pages,
                    max_page_used
                )));
            }

            reports.push(DocumentReport {
                topic: topic.name.clone(),
                path: path.clone(),
                pages,
                max_page_used,
            });
        }

        Ok(reports)
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Bounded wait applied to each external call
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_secs)
    }

    /// Fixed generation parameters
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_output_tokens: self.model.max_output_tokens,
            temperature: self.model.temperature,
        }
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
