// Language model module
// Chat-completion capability used to phrase answers from retrieved chunks

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

pub use openai::{ModelInfo, OpenAiClient};

/// A chat-completion backend.
///
/// Receives a fixed system instruction and the user message, and returns the
/// model's reply. Any failure (transport, timeout, non-2xx status, malformed
/// body) is reported as an error.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}
