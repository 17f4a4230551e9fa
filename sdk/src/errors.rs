//! Error types and handling
//!
//! This module provides the error types used throughout the quiz server.
//! Session errors implement the `QuizErrorExt` trait which provides the fixed
//! message sent to the client and whether the session can carry on.
//!
//! # Security
//!
//! Client messages are static strings. The detailed cause carried by a
//! variant (file paths, provider responses) is for logs only and never
//! reaches the wire.

use thiserror::Error;

/// Trait for quiz error extensions
pub trait QuizErrorExt {
    /// Returns the message sent to the client in an `error` response
    ///
    /// The message is one of a fixed set of strings and never contains the
    /// underlying cause.
    fn client_message(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors leave the session usable as-is. Non-recoverable
    /// errors point at a broken deployment (missing document, model down).
    fn is_recoverable(&self) -> bool;
}

/// Errors raised while handling one client turn
///
/// Every variant is caught by the session coordinator and converted into a
/// single `{"type": "error", "message": ...}` response. None of them end the
/// session loop.
///
/// # Examples
///
/// ```
/// use sdk::errors::{QuizError, QuizErrorExt};
///
/// let error = QuizError::UnknownTopic("Chemistry".to_string());
/// assert_eq!(error.client_message(), "Invalid topic");
/// assert!(error.is_recoverable());
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuizError {
    // Catalog errors
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Topic has no subtopics: {0}")]
    NoSubtopics(String),

    #[error("Unknown subtopic: {0}")]
    UnknownSubtopic(String),

    // Extraction errors
    #[error("Extracted page is empty")]
    EmptyExtraction,

    #[error("Extraction failed: {0}")]
    Extraction(String),

    // Model errors
    #[error("Question generation failed: {0}")]
    Generation(String),

    #[error("Answer evaluation failed: {0}")]
    Evaluation(String),

    #[error("External call timed out")]
    Timeout,

    // Protocol errors
    #[error("Answer submitted before any question was generated")]
    NoPendingQuestion,

    #[error("Answer is empty")]
    EmptyAnswer,

    #[error("Message matches no known shape")]
    UnrecognizedMessage,

    #[error("Message is not valid JSON: {0}")]
    MalformedMessage(String),
}

impl QuizErrorExt for QuizError {
    fn client_message(&self) -> &str {
        match self {
            Self::UnknownTopic(_) => "Invalid topic",
            Self::NoSubtopics(_) => "No subtopics available for this topic",
            Self::UnknownSubtopic(_) => "Invalid subtopic selected",
            Self::EmptyExtraction => "No content found for this subtopic",
            Self::Extraction(_) => "Failed to read content for this subtopic",
            Self::Generation(_) => "Failed to generate a question",
            Self::Evaluation(_) => "Failed to evaluate the answer",
            Self::Timeout => "The request timed out",
            Self::NoPendingQuestion => "No question has been asked yet",
            Self::EmptyAnswer => "No answer provided",
            Self::UnrecognizedMessage => "Unrecognized message",
            Self::MalformedMessage(_) => "Malformed message",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Extraction(_) | Self::NoSubtopics(_))
    }
}

/// Process-level errors raised at startup or by the transport
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document error for topic {topic}: {reason}")]
    Document { topic: String, reason: String },

    #[error("Server error: {0}")]
    Server(String),
}
