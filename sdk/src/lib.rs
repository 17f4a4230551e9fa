//! Quiz SDK
//!
//! Shared wire protocol and error types for the quiz server and its clients.

/// Error types and handling
pub mod errors;

/// Wire protocol messages
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, QuizError, QuizErrorExt};
pub use types::{ClientMessage, ServerMessage};
