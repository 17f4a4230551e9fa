//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use quiz_engine::catalog::Catalog;
use quiz_engine::llm::{GenerationOptions, LLMError, ModelBackend, Result as LLMResult};
use quiz_engine::session::{QuizServices, ServiceSettings};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[path = "../../src/extractor/fixtures.rs"]
mod fixtures;

pub use fixtures::write_pdf;

/// Text placed on page `page` of the generated reference documents.
pub fn page_text(topic: &str, page: u32) -> String {
    match (topic, page) {
        ("AI", 7) => "Artificial intelligence lets machines reason about problems".to_string(),
        ("AI", 16) => "Voice assistants and maps use AI every day".to_string(),
        ("ML", 10) => "A dataset is a collection of labelled examples".to_string(),
        _ => format!("Filler page {} of {}", page, topic),
    }
}

/// Write 30-page reference documents for the built-in AI and ML topics.
pub fn write_reference_documents(dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut documents = BTreeMap::new();
    for topic in ["AI", "ML"] {
        let pages: Vec<String> = (1..=30).map(|page| page_text(topic, page)).collect();
        let pages: Vec<&str> = pages.iter().map(String::as_str).collect();
        let path = dir.join(format!("{}.pdf", topic.to_lowercase()));
        write_pdf(&path, &pages);
        documents.insert(topic.to_string(), path);
    }
    documents
}

/// Deterministic stand-in for the model server.
///
/// Generation echoes the first words of the context; embeddings are
/// bag-of-words counts over 64 buckets.
#[derive(Default)]
pub struct FakeBackend {
    pub fail_generation: AtomicBool,
}

impl FakeBackend {
    pub fn set_failing(&self, failing: bool) {
        self.fail_generation.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> LLMResult<String> {
        if self.fail_generation.load(Ordering::SeqCst) {
            return Err(LLMError::ProviderUnavailable("model offline".into()));
        }
        let context = prompt.split("context: ").nth(1).unwrap_or_default();
        let words: Vec<&str> = context.split_whitespace().take(4).collect();
        Ok(format!("What is meant by {}", words.join(" ")))
    }

    async fn embed(&self, text: &str) -> LLMResult<Vec<f32>> {
        let mut vector = vec![0.0f32; 64];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % 64] += 1.0;
        }
        Ok(vector)
    }
}

/// Built-in catalog served from freshly written reference documents.
pub fn builtin_services(dir: &Path, backend: Arc<dyn ModelBackend>) -> Arc<QuizServices> {
    Arc::new(QuizServices::new(
        Arc::new(Catalog::builtin()),
        write_reference_documents(dir),
        backend,
        ServiceSettings::default(),
    ))
}
