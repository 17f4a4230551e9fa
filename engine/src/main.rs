// Quiz server
// Main entry point for the quizd binary

use clap::Parser;
use quiz_engine::catalog::Catalog;
use quiz_engine::cli::{Cli, Command};
use quiz_engine::config::Config;
use quiz_engine::llm::ollama::OllamaBackend;
use quiz_engine::llm::{ModelBackend, SerializedBackend};
use quiz_engine::server;
use quiz_engine::session::QuizServices;
use quiz_engine::telemetry::init_telemetry_with_level;
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let loaded = match &cli.config {
        Some(config_path) => Config::load_from_path(config_path),
        None => Config::load_or_create(),
    };

    // --log wins over the configured level; RUST_LOG wins over both
    let log_level = match (&cli.log, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.core.log_level.clone(),
        (None, Err(_)) => "info".to_string(),
    };
    init_telemetry_with_level(&log_level);

    let mut config = loaded?;
    let catalog = Arc::new(Catalog::builtin());

    tracing::debug!("quizd v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            for report in config.validate_documents(&catalog)? {
                tracing::info!(
                    "Topic {} uses {} ({} pages)",
                    report.topic,
                    report.path.display(),
                    report.pages
                );
            }

            let backend = build_backend(&config);
            if !backend.check_health().await {
                tracing::warn!(
                    "Model backend at {} is not reachable; questions will fail until it is",
                    config.model.base_url
                );
            }

            let services = Arc::new(QuizServices::from_config(&config, catalog, backend));
            server::serve(&config.bind_address(), services, shutdown_signal()).await?;
            Ok(())
        }

        Command::Check => {
            let reports = config.validate_documents(&catalog)?;
            let healthy = build_backend(&config).check_health().await;

            if cli.json {
                let output = json!({
                    "documents": reports,
                    "model": {
                        "base_url": config.model.base_url,
                        "generation_model": config.model.generation_model,
                        "embedding_model": config.model.embedding_model,
                        "reachable": healthy,
                    }
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Documents:");
                for report in &reports {
                    println!(
                        "  {:<4} {} ({} pages, highest used {})",
                        report.topic,
                        report.path.display(),
                        report.pages,
                        report.max_page_used
                    );
                }
                println!(
                    "Model backend ({}): {}",
                    config.model.base_url,
                    if healthy { "reachable" } else { "unreachable" }
                );
            }
            Ok(())
        }

        Command::Topics => {
            if cli.json {
                let topics: Vec<_> = catalog
                    .topics()
                    .map(|topic| {
                        let subtopics: Vec<_> = topic
                            .subtopics
                            .iter()
                            .map(|s| json!({ "name": s.name, "page": s.page }))
                            .collect();
                        json!({ "topic": topic.name, "subtopics": subtopics })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&topics)?);
            } else {
                for topic in catalog.topics() {
                    println!("{}", topic.name);
                    for subtopic in &topic.subtopics {
                        println!("  p.{:<3} {}", subtopic.page, subtopic.name);
                    }
                }
            }
            Ok(())
        }
    }
}

/// Build the Ollama backend, serialized when configured
fn build_backend(config: &Config) -> Arc<dyn ModelBackend> {
    let ollama: Arc<dyn ModelBackend> = Arc::new(OllamaBackend::new(
        config.model.base_url.clone(),
        config.model.generation_model.clone(),
        config.model.embedding_model.clone(),
        config.call_timeout(),
    ));

    if config.model.serialize_calls {
        Arc::new(SerializedBackend::new(ollama))
    } else {
        ollama
    }
}

/// Resolves on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
