// Embeddings module
// Chunking of uploaded documents and the text-to-vector capability

pub mod chunking;
pub mod hashing;

pub use chunking::{Chunk, ChunkingConfig, build_chunks, chunk_document, tokenize};
pub use hashing::{DEFAULT_EMBEDDING_DIMENSION, HashEmbedder};

/// A fixed-length embedding
pub type Vector = Vec<f32>;

/// Turns text into a fixed-length vector.
///
/// Implementations must be deterministic and must return vectors of
/// exactly [`Embedder::dimension`] elements for any input, including the
/// empty string.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vector;

    fn dimension(&self) -> usize;
}
