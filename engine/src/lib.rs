//! Quiz Engine Library
//!
//! This library provides the core functionality of the quiz server.
//! It is used by both the main binary and integration tests.

/// Topic and subtopic catalog
pub mod catalog;

/// CLI interface module
pub mod cli;

/// Configuration management module
pub mod config;

/// PDF page text extraction
pub mod extractor;

/// Model backend abstraction layer
pub mod llm;

/// Question generation and answer evaluation
pub mod quiz;

/// HTTP and WebSocket server
pub mod server;

/// Per-connection session coordinator
pub mod session;

/// Telemetry and Observability
pub mod telemetry;
