//! Retrieval
//!
//! Scores every indexed chunk against a query with cosine similarity, ranks
//! the results and applies the minimum-confidence gate.


use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::embeddings::{Chunk, Embedder};
use crate::index::IndexSnapshot;

/// Score assigned when similarity is undefined (zero-norm or mismatched vectors)
pub const MIN_SCORE: f32 = -1.0;

/// Retrieval tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of chunks handed to the answer stage
    pub top_k: usize,
    /// Best score required before an answer is generated
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: 0.2,
        }
    }
}

/// A chunk paired with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Result of running a query through retrieval and the confidence gate
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// Nothing has been indexed yet
    NoDocument,
    /// The best match scored below the configured minimum
    LowConfidence { best_score: f32 },
    /// Ranked matches, best first
    Matches(Vec<ScoredChunk>),
}

/// Cosine similarity of two vectors.
///
/// Returns [`MIN_SCORE`] when either vector has zero norm, the lengths
/// differ, or the result is not finite.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return MIN_SCORE;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return MIN_SCORE;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        MIN_SCORE
    }
}

/// Sort best first; equal scores keep ascending chunk order
#[inline]
pub fn rank(mut scored: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk.index.cmp(&b.chunk.index))
    });
    scored
}

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, config: RetrievalConfig) -> Self {
        Self { embedder, config }
    }

    #[inline]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Score every chunk in the snapshot and keep the best `top_k`
    #[inline]
    pub fn retrieve(&self, query: &str, snapshot: &IndexSnapshot) -> Vec<ScoredChunk> {
        if snapshot.is_empty() || self.config.top_k == 0 {
            return Vec::new();
        }

        let query_vector = self.embedder.embed(query);

        let scored = snapshot
            .entries()
            .map(|(chunk, vector)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_vector, vector),
            })
            .collect();

        let mut ranked = rank(scored);
        ranked.truncate(self.config.top_k);

        debug!(
            "Retrieved {} of {} chunks, best score {:?}",
            ranked.len(),
            snapshot.len(),
            ranked.first().map(|s| s.score)
        );

        ranked
    }

    /// Retrieve and apply the confidence gate
    #[inline]
    pub fn evaluate(&self, query: &str, snapshot: &IndexSnapshot) -> Retrieval {
        if snapshot.is_empty() {
            return Retrieval::NoDocument;
        }

        let ranked = self.retrieve(query, snapshot);
        match ranked.first() {
            Some(best) if best.score >= self.config.min_score => Retrieval::Matches(ranked),
            Some(best) => Retrieval::LowConfidence {
                best_score: best.score,
            },
            None => Retrieval::LowConfidence {
                best_score: MIN_SCORE,
            },
        }
    }
}

impl std::fmt::Debug for Retriever {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
