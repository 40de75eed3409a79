//! Answer composition
//!
//! Renders retrieved chunks into a numbered context block and asks the
//! completion backend to answer from those sources only.


use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::llm::CompletionClient;
use crate::retrieval::ScoredChunk;
use crate::{RagError, Result};

pub const SYSTEM_INSTRUCTION: &str = "Answer using only the sources. Cite like [1][2].";
pub const UPLOAD_FIRST_ANSWER: &str = "Please upload a document first.";
pub const LOW_CONFIDENCE_ANSWER: &str =
    "I couldn’t find enough information to answer this question.";
pub const FAILURE_ANSWER: &str = "Sorry, something went wrong while generating the answer.";

/// A cited chunk, numbered by its position in the rendered context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl Answer {
    /// An answer that cites nothing
    #[inline]
    pub fn without_sources(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            sources: Vec::new(),
        }
    }

    #[inline]
    pub fn upload_first() -> Self {
        Self::without_sources(UPLOAD_FIRST_ANSWER)
    }

    #[inline]
    pub fn low_confidence() -> Self {
        Self::without_sources(LOW_CONFIDENCE_ANSWER)
    }

    #[inline]
    pub fn failure() -> Self {
        Self::without_sources(FAILURE_ANSWER)
    }
}

/// Render chunks as `[n] text` lines, numbered from 1 in rank order
#[inline]
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, scored)| format!("[{}] {}", i + 1, scored.chunk.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[inline]
pub fn build_user_message(question: &str, context: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}", context, question)
}

/// Sources in the same order and numbering as [`build_context`]
#[inline]
pub fn sources_for(chunks: &[ScoredChunk]) -> Vec<Source> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, scored)| Source {
            id: i + 1,
            text: scored.chunk.text.clone(),
        })
        .collect()
}

pub struct AnswerComposer {
    client: Arc<dyn CompletionClient>,
}

impl AnswerComposer {
    #[inline]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Ask the completion backend to answer `question` from `chunks`.
    ///
    /// Any backend failure, including an empty reply, becomes [`RagError::Llm`].
    #[inline]
    pub async fn compose(&self, question: &str, chunks: &[ScoredChunk]) -> Result<Answer> {
        let context = build_context(chunks);
        let user_message = build_user_message(question, &context);

        debug!(
            "Composing answer from {} sources ({} context characters)",
            chunks.len(),
            context.len()
        );

        let reply = self
            .client
            .complete(SYSTEM_INSTRUCTION, &user_message)
            .await
            .map_err(|e| {
                error!("Completion request failed: {:#}", e);
                RagError::Llm(e.to_string())
            })?;

        if reply.trim().is_empty() {
            error!("Completion backend returned an empty reply");
            return Err(RagError::Llm("empty completion".to_string()));
        }

        Ok(Answer {
            answer: reply,
            sources: sources_for(chunks),
        })
    }
}

impl std::fmt::Debug for AnswerComposer {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerComposer").finish_non_exhaustive()
    }
}
