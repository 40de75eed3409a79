//! Document Index
//!
//! Holds the chunks of the current document together with their vectors.
//! Every upload builds a complete [`IndexSnapshot`] first and then swaps it
//! in, so readers always see the chunks and vectors of one upload.


use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::embeddings::{Chunk, Embedder, Vector, build_chunks};

/// Chunks of one document and their vectors, paired by position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    chunks: Vec<Chunk>,
    vectors: Vec<Vector>,
}

impl IndexSnapshot {
    /// Embed every chunk text and pair it with its vector
    #[inline]
    pub fn build(texts: Vec<String>, embedder: &dyn Embedder) -> Self {
        let vectors = texts.iter().map(|text| embedder.embed(text)).collect();
        Self {
            chunks: build_chunks(texts),
            vectors,
        }
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[inline]
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// Iterate over chunk and vector pairs in document order
    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = (&Chunk, &Vector)> {
        self.chunks.iter().zip(self.vectors.iter())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Process-wide store for the current document
pub struct DocumentIndex {
    embedder: Arc<dyn Embedder>,
    current: RwLock<Arc<IndexSnapshot>>,
}

impl DocumentIndex {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            current: RwLock::new(Arc::new(IndexSnapshot::default())),
        }
    }

    /// Replace the indexed document with the given chunk texts.
    ///
    /// Returns the number of chunks now indexed.
    #[inline]
    pub async fn replace(&self, texts: Vec<String>) -> usize {
        let snapshot = Arc::new(IndexSnapshot::build(texts, self.embedder.as_ref()));
        let count = snapshot.len();
        debug!(
            "Built snapshot with {} chunks of dimension {}",
            count,
            self.embedder.dimension()
        );

        *self.current.write().await = snapshot;

        info!("Index replaced with {} chunks", count);
        count
    }

    /// The snapshot published by the most recent replace
    #[inline]
    pub async fn snapshot(&self) -> Arc<IndexSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    #[inline]
    pub async fn current_chunks(&self) -> Vec<Chunk> {
        self.snapshot().await.chunks().to_vec()
    }

    #[inline]
    pub async fn current_vectors(&self) -> Vec<Vector> {
        self.snapshot().await.vectors().to_vec()
    }

    #[inline]
    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    #[inline]
    pub async fn is_empty(&self) -> bool {
        self.snapshot().await.is_empty()
    }

    #[inline]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }
}

impl std::fmt::Debug for DocumentIndex {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("dimension", &self.embedder.dimension())
            .finish_non_exhaustive()
    }
}
