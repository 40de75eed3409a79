//! Question-answering service
//!
//! Owns the document index and wires chunking, retrieval and answer
//! composition together for the upload and ask operations.


use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::answer::{Answer, AnswerComposer};
use crate::config::Config;
use crate::embeddings::{ChunkingConfig, Embedder, HashEmbedder, chunk_document};
use crate::index::DocumentIndex;
use crate::llm::{CompletionClient, OpenAiClient};
use crate::retrieval::{Retrieval, RetrievalConfig, Retriever};
use crate::{RagError, Result};

#[derive(Debug)]
pub struct RagService {
    index: DocumentIndex,
    retriever: Retriever,
    composer: AnswerComposer,
    chunking: ChunkingConfig,
}

impl RagService {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        client: Arc<dyn CompletionClient>,
        chunking: ChunkingConfig,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            index: DocumentIndex::new(Arc::clone(&embedder)),
            retriever: Retriever::new(embedder, retrieval),
            composer: AnswerComposer::new(client),
            chunking,
        }
    }

    /// Build a service with the hashing embedder and an OpenAI-compatible client
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(&config.llm).context("Failed to create completion client")?;

        Ok(Self::new(
            Arc::new(HashEmbedder::default()),
            Arc::new(client),
            config.chunking.clone(),
            config.retrieval.clone(),
        ))
    }

    #[inline]
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Chunk and index `text`, replacing any previous document.
    ///
    /// Returns the number of chunks indexed. Missing or blank text is a
    /// validation error and leaves the index untouched.
    #[inline]
    pub async fn upload(&self, text: Option<&str>) -> Result<usize> {
        let text = text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RagError::Validation("No text provided".to_string()))?;

        let chunks = chunk_document(text, &self.chunking);
        debug!("Uploaded document split into {} chunks", chunks.len());

        let count = self.index.replace(chunks).await;
        info!("Document indexed with {} chunks", count);
        Ok(count)
    }

    /// Answer `question` from the current document.
    ///
    /// The index is read once before the completion call, so uploads are
    /// never blocked behind a slow language model.
    #[inline]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            debug!("Empty question, nothing to answer");
            return Ok(Answer::upload_first());
        }

        let snapshot = self.index.snapshot().await;

        match self.retriever.evaluate(question, &snapshot) {
            Retrieval::NoDocument => {
                debug!("Question asked before any document was uploaded");
                Ok(Answer::upload_first())
            }
            Retrieval::LowConfidence { best_score } => {
                warn!(
                    "Best score {:.3} below threshold {:.3}, refusing to answer",
                    best_score,
                    self.retriever.config().min_score
                );
                Ok(Answer::low_confidence())
            }
            Retrieval::Matches(matches) => {
                debug!(
                    "Answering from {} chunks (best score {:.3})",
                    matches.len(),
                    matches.first().map_or(0.0, |m| m.score)
                );
                self.composer.compose(question, &matches).await
            }
        }
    }
}
