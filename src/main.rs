use clap::{Parser, Subcommand};
use rag_qa::commands::{check_llm, init_config, serve, show_config};
use rag_qa::config::Config;
use rag_qa::{RagError, Result};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rag-qa")]
#[command(about = "Retrieval-augmented question answering over an uploaded document")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ~/.rag-qa/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind, overrides configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overrides configuration
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write a default configuration file, or show the effective configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Check that the language model endpoint is reachable
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::load(config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config
                .validate()
                .map_err(|e| RagError::Config(e.to_string()))?;
            serve(config).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&Config::load(config_path)?, config_path)?;
            } else {
                init_config(config_path)?;
            }
        }
        Commands::Check => {
            check_llm(&Config::load(config_path)?).await?;
        }
    }

    Ok(())
}
