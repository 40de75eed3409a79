// Configuration management module
// TOML settings with environment overrides for the server, language model and retrieval

pub mod settings;


pub use settings::{Config, ConfigError, LlmConfig, ServerConfig};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
