//! Session coordinator
//!
//! One `Session` per connection. It owns the connection's quiz state (the
//! selected topic and the pending question with its context), validates each
//! incoming message against that state, calls the catalog, extractor,
//! generator and evaluator, and produces exactly one response per message.
//!
//! ```text
//! Idle ──topic──▶ TopicSelected ──subtopic──▶ QuestionPending ──answer──┐
//!   ▲                 ▲   │                        │   ▲                │
//!   └─ any failure ───┘   └──── topic (any state) ─┘   └────────────────┘
//! ```
//!
//! Failures never change state and never end the session: every error is
//! turned into a single `error` response for this connection only.

use sdk::errors::{QuizError, QuizErrorExt};
use sdk::types::{ClientMessage, ServerMessage};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::extractor;
use crate::llm::{GenerationOptions, ModelBackend};
use crate::quiz::{AnswerEvaluator, Difficulty, QuestionGenerator};

/// Process-wide services shared read-only by every session
pub struct QuizServices {
    catalog: Arc<Catalog>,
    documents: BTreeMap<String, PathBuf>,
    generator: QuestionGenerator,
    evaluator: AnswerEvaluator,
    char_limit: usize,
    call_timeout: Duration,
}

/// Tunables for `QuizServices`
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub char_limit: usize,
    pub call_timeout: Duration,
    pub max_prompt_chars: usize,
    pub generation: GenerationOptions,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            char_limit: extractor::DEFAULT_CHAR_LIMIT,
            call_timeout: Duration::from_secs(120),
            max_prompt_chars: 2048,
            generation: GenerationOptions::default(),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            char_limit: config.extraction.char_limit,
            call_timeout: config.call_timeout(),
            max_prompt_chars: config.model.max_prompt_chars,
            generation: config.generation_options(),
        }
    }
}

impl QuizServices {
    pub fn new(
        catalog: Arc<Catalog>,
        documents: BTreeMap<String, PathBuf>,
        backend: Arc<dyn ModelBackend>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            catalog,
            documents,
            generator: QuestionGenerator::new(
                Arc::clone(&backend),
                settings.generation,
                settings.max_prompt_chars,
            ),
            evaluator: AnswerEvaluator::new(backend),
            char_limit: settings.char_limit,
            call_timeout: settings.call_timeout,
        }
    }

    /// Build services from a loaded configuration.
    pub fn from_config(
        config: &Config,
        catalog: Arc<Catalog>,
        backend: Arc<dyn ModelBackend>,
    ) -> Self {
        Self::new(
            catalog,
            config.documents.clone(),
            backend,
            ServiceSettings::from_config(config),
        )
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run `fut` under the per-call timeout.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, QuizError>
    where
        F: Future<Output = Result<T, QuizError>>,
    {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| QuizError::Timeout)?
    }

    /// Extract page text off the async runtime.
    async fn extract(&self, document: PathBuf, page: u32) -> Result<String, QuizError> {
        let char_limit = self.char_limit;
        let task =
            tokio::task::spawn_blocking(move || extractor::extract(&document, page, char_limit));

        self.bounded(async move {
            task.await
                .map_err(|e| QuizError::Extraction(format!("extraction task failed: {}", e)))?
        })
        .await
    }
}

/// Coarse state of a session, derived from what it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    TopicSelected,
    QuestionPending,
}

#[derive(Debug, Clone)]
struct SelectedTopic {
    name: String,
    document: PathBuf,
}

#[derive(Debug, Clone)]
struct PendingQuestion {
    context: String,
    question: String,
}

/// Per-connection quiz state machine
pub struct Session {
    services: Arc<QuizServices>,
    topic: Option<SelectedTopic>,
    pending: Option<PendingQuestion>,
}

impl Session {
    pub fn new(services: Arc<QuizServices>) -> Self {
        Self {
            services,
            topic: None,
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.topic, &self.pending) {
            (_, Some(_)) => SessionState::QuestionPending,
            (Some(_), None) => SessionState::TopicSelected,
            (None, None) => SessionState::Idle,
        }
    }

    /// Currently selected topic.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_ref().map(|t| t.name.as_str())
    }

    /// Question awaiting an answer.
    pub fn pending_question(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.question.as_str())
    }

    /// Handle one raw text frame.
    pub async fn handle_text(&mut self, text: &str) -> ServerMessage {
        match ClientMessage::parse(text) {
            Ok(message) => self.handle(message).await,
            Err(err) => self.reject(err),
        }
    }

    /// Handle one parsed message and produce its response.
    pub async fn handle(&mut self, message: ClientMessage) -> ServerMessage {
        let kind = message.kind();
        tracing::debug!(kind, state = ?self.state(), "Handling message");

        let result = match message {
            ClientMessage::Topic { topic } => self.select_topic(topic),
            ClientMessage::Subtopic { subtopic, level } => {
                self.request_question(&subtopic, &level).await
            }
            ClientMessage::Answer { answer } => self.submit_answer(&answer).await,
        };

        result.unwrap_or_else(|err| self.reject(err))
    }

    fn reject(&self, err: QuizError) -> ServerMessage {
        if err.is_recoverable() {
            tracing::warn!(state = ?self.state(), "Rejected turn: {}", err);
        } else {
            tracing::error!(state = ?self.state(), "Turn failed: {}", err);
        }
        ServerMessage::error(&err)
    }

    fn select_topic(&mut self, topic: String) -> Result<ServerMessage, QuizError> {
        let catalog = self.services.catalog();

        let subtopics: Vec<String> = catalog
            .subtopics(&topic)?
            .into_iter()
            .map(str::to_string)
            .collect();

        // A topic without a reference document cannot be quizzed on
        let document = self
            .services
            .documents
            .get(&topic)
            .cloned()
            .ok_or_else(|| QuizError::UnknownTopic(topic.clone()))?;

        if subtopics.is_empty() {
            return Err(QuizError::NoSubtopics(topic));
        }

        tracing::info!(topic = %topic, subtopics = subtopics.len(), "Topic selected");

        self.topic = Some(SelectedTopic {
            name: topic,
            document,
        });
        self.pending = None;

        Ok(ServerMessage::Subtopics { subtopics })
    }

    async fn request_question(
        &mut self,
        subtopic: &str,
        level: &str,
    ) -> Result<ServerMessage, QuizError> {
        // Without a topic the lookup has nothing to resolve against
        let selected = self
            .topic
            .as_ref()
            .ok_or_else(|| QuizError::UnknownSubtopic(subtopic.to_string()))?;

        let page = self.services.catalog().page_for(&selected.name, subtopic)?;

        let context = self
            .services
            .extract(selected.document.clone(), page)
            .await?;
        if context.trim().is_empty() {
            return Err(QuizError::EmptyExtraction);
        }

        let difficulty = Difficulty::parse(level);
        let question = self
            .services
            .bounded(self.services.generator.generate(&context, &difficulty))
            .await?;

        tracing::info!(
            topic = %selected.name,
            subtopic,
            page,
            level,
            "Question generated"
        );

        self.pending = Some(PendingQuestion {
            context,
            question: question.clone(),
        });

        Ok(ServerMessage::Question { question })
    }

    async fn submit_answer(&mut self, answer: &str) -> Result<ServerMessage, QuizError> {
        let pending = self.pending.as_ref().ok_or(QuizError::NoPendingQuestion)?;

        if answer.trim().is_empty() {
            return Err(QuizError::EmptyAnswer);
        }

        let evaluation = self
            .services
            .bounded(self.services.evaluator.evaluate(&pending.context, answer))
            .await?;

        tracing::info!(
            question = %pending.question,
            similarity = evaluation.similarity,
            score = evaluation.score,
            "Answer evaluated"
        );

        Ok(ServerMessage::Evaluation {
            score: evaluation.score,
            feedback: evaluation.feedback.as_str().to_string(),
        })
    }
}
