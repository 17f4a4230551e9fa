//! CLI interface for quizd
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines the commands and global flags for running the quiz server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interactive AI/ML quiz server
///
/// Serves quiz sessions over WebSocket. Questions are generated from pages of
/// reference PDFs and answers are scored by embedding similarity.
#[derive(Parser, Debug)]
#[command(name = "quizd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the quiz server
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check reference documents and model availability
    Check,

    /// List topics and subtopics with their pages
    Topics,
}
