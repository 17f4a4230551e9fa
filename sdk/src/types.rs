//! Wire protocol types
//!
//! Messages exchanged over the quiz WebSocket. Client messages carry no tag;
//! their shape is recognized from the keys present, checked in the order
//! topic, subtopic + level, answer. Server messages carry a `type` tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{QuizError, QuizErrorExt};

/// Message sent by a client
///
/// Serializes to the bare object clients send. Incoming frames go through
/// `parse`, not `Deserialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// Select (or re-select) a topic.
    Topic { topic: String },

    /// Request a question about a subtopic of the selected topic.
    Subtopic { subtopic: String, level: String },

    /// Answer the pending question.
    Answer { answer: String },
}

impl ClientMessage {
    /// Parse a raw text frame.
    ///
    /// The variant is picked by which keys are present, in the order
    /// `topic`, `subtopic` + `level`, `answer`. Text that is not JSON is
    /// `MalformedMessage`; a JSON value with none of those keys, or whose
    /// chosen keys are not strings, is `UnrecognizedMessage`. Extra keys are
    /// ignored.
    pub fn parse(text: &str) -> Result<Self, QuizError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| QuizError::MalformedMessage(e.to_string()))?;

        let object = value.as_object().ok_or(QuizError::UnrecognizedMessage)?;
        let field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(QuizError::UnrecognizedMessage)
        };

        if object.contains_key("topic") {
            Ok(Self::Topic {
                topic: field("topic")?,
            })
        } else if object.contains_key("subtopic") && object.contains_key("level") {
            Ok(Self::Subtopic {
                subtopic: field("subtopic")?,
                level: field("level")?,
            })
        } else if object.contains_key("answer") {
            Ok(Self::Answer {
                answer: field("answer")?,
            })
        } else {
            Err(QuizError::UnrecognizedMessage)
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Topic { .. } => "topic",
            Self::Subtopic { .. } => "subtopic",
            Self::Answer { .. } => "answer",
        }
    }
}

/// Message sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Subtopics of the selected topic, in catalog order.
    Subtopics { subtopics: Vec<String> },

    /// A generated question; always ends with `?`.
    Question { question: String },

    /// Score in `1..=10` and one of four fixed feedback strings.
    Evaluation { score: u8, feedback: String },

    /// Any failure while handling a turn.
    Error { message: String },
}

impl ServerMessage {
    /// Build an error response carrying the client-safe message.
    pub fn error(err: &QuizError) -> Self {
        Self::Error {
            message: err.client_message().to_string(),
        }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> String {
        // A tagged enum of strings, integers and string lists always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","message":"Internal serialization failure"}"#.to_string()
        })
    }
}
