//! Question generator
//!
//! Builds a difficulty-qualified prompt from the extracted page text, asks
//! the generation model for a question, and normalizes the reply so it
//! always ends with a question mark.

use sdk::errors::QuizError;
use std::sync::Arc;

use crate::llm::{GenerationOptions, ModelBackend};

/// Requested question difficulty
///
/// Parsing never fails: strings other than `easy`, `medium` and `hard` are
/// kept as `Other` and produce an unqualified prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Other(String),
}

impl Difficulty {
    pub fn parse(level: &str) -> Self {
        match level {
            "easy" => Self::Easy,
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            other => Self::Other(other.to_string()),
        }
    }

    /// Qualifier embedded in the prompt, if any.
    pub fn qualifier(&self) -> Option<&'static str> {
        match self {
            Self::Easy => Some("simple"),
            Self::Medium => Some("moderate"),
            Self::Hard => Some("difficult"),
            Self::Other(_) => None,
        }
    }
}

/// Generates one question per call from a context passage
pub struct QuestionGenerator {
    backend: Arc<dyn ModelBackend>,
    options: GenerationOptions,
    max_prompt_chars: usize,
}

impl QuestionGenerator {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        options: GenerationOptions,
        max_prompt_chars: usize,
    ) -> Self {
        Self {
            backend,
            options,
            max_prompt_chars,
        }
    }

    /// Prompt sent to the generation model.
    ///
    /// The context is cut to `max_prompt_chars` characters.
    pub fn build_prompt(&self, context: &str, level: &Difficulty) -> String {
        let context: String = context.chars().take(self.max_prompt_chars).collect();
        match level.qualifier() {
            Some(qualifier) => format!("generate question: {} | context: {}", qualifier, context),
            None => format!("generate question: | context: {}", context),
        }
    }

    /// Generate a question about `context` at difficulty `level`.
    ///
    /// # Errors
    ///
    /// `QuizError::Generation` if the model call fails or returns nothing.
    pub async fn generate(&self, context: &str, level: &Difficulty) -> Result<String, QuizError> {
        let prompt = self.build_prompt(context, level);

        let raw = self
            .backend
            .generate(&prompt, &self.options)
            .await
            .map_err(|e| QuizError::Generation(e.to_string()))?;

        let question = ensure_question_mark(&raw);
        if question == "?" {
            return Err(QuizError::Generation(format!(
                "{} returned an empty question",
                self.backend.name()
            )));
        }

        Ok(question)
    }
}

/// Trim `raw` and append `?` unless it already ends with one.
pub fn ensure_question_mark(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.ends_with('?') {
        trimmed.to_string()
    } else {
        format!("{}?", trimmed)
    }
}
