use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{Config, get_config_dir};
use crate::llm::OpenAiClient;
use crate::server::run_server;

/// Start the HTTP service
#[inline]
pub async fn serve(config: Config) -> Result<()> {
    info!(
        "Starting server on {} with model {} at {}",
        config.bind_address(),
        config.llm.model,
        config.llm.base_url
    );

    if config.llm.api_key.is_empty() {
        warn!("No language model API key configured; set LLM_API_KEY or GROQ_API_KEY");
    }

    run_server(config).await
}

/// Print the effective configuration with the API key masked
#[inline]
pub fn show_config(config: &Config, config_path: Option<&Path>) -> Result<()> {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server Settings:").bold().yellow());
    eprintln!("  Address: {}", style(config.bind_address()).cyan());
    eprintln!("  CORS Origin: {}", style(&config.server.cors_origin).cyan());
    eprintln!(
        "  Body Limit: {} bytes",
        style(config.server.body_limit_bytes).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Language Model Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.llm.base_url).cyan());
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    eprintln!("  API Key: {}", style(config.llm.masked_api_key()).cyan());
    eprintln!("  Timeout: {}s", style(config.llm.timeout_secs).cyan());
    eprintln!("  Retry Attempts: {}", style(config.llm.retry_attempts).cyan());

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!("  Min Score: {}", style(config.retrieval.min_score).cyan());
    eprintln!(
        "  Window Size: {} words",
        style(config.chunking.window_size).cyan()
    );
    eprintln!("  Overlap: {} words", style(config.chunking.overlap).cyan());

    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => get_config_dir()
            .context("Failed to get config directory")?
            .join("config.toml"),
    };
    eprintln!();
    if config_path.exists() {
        eprintln!("Config file: {}", style(config_path.display()).dim());
    } else {
        eprintln!(
            "Config file: {} {}",
            style(config_path.display()).dim(),
            style("(not found, using defaults)").yellow()
        );
    }

    Ok(())
}

/// Write the default configuration unless a file already exists.
///
/// Returns the path of the configuration file.
#[inline]
pub fn init_config(config_path: Option<&Path>) -> Result<PathBuf> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::config_file_path().context("Failed to get config file path")?,
    };

    if config_path.exists() {
        eprintln!(
            "{} {}",
            style("Configuration already exists:").yellow(),
            config_path.display()
        );
        return Ok(config_path);
    }

    Config::default()
        .save(&config_path)
        .context("Failed to write default configuration")?;

    eprintln!(
        "{} {}",
        style("✅ Wrote default configuration to").green(),
        config_path.display()
    );
    eprintln!("Set LLM_API_KEY (or GROQ_API_KEY) in the environment; it is not stored in the file.");

    Ok(config_path)
}

/// Verify the language model endpoint is reachable and serves the configured model
#[inline]
pub async fn check_llm(config: &Config) -> Result<()> {
    let client = OpenAiClient::new(&config.llm).context("Failed to create completion client")?;

    let result = tokio::task::spawn_blocking(move || client.health_check())
        .await
        .context("Health check task panicked")?;

    match result {
        Ok(()) => {
            println!(
                "✅ {} is reachable and serves {}",
                config.llm.base_url, config.llm.model
            );
            Ok(())
        }
        Err(e) => {
            error!("❌ Language model health check failed: {:#}", e);
            println!("Error: Cannot use {} at {}", config.llm.model, config.llm.base_url);
            println!("Check LLM_BASE_URL, LLM_MODEL and LLM_API_KEY.");
            Err(e)
        }
    }
}
