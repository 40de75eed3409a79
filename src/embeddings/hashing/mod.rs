
use super::{Embedder, Vector};

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 128;

/// Character-code bucket embedding.
///
/// The UTF-16 code unit at position `i` adds its value to bucket `i % dimension`,
/// so a character outside the Basic Multilingual Plane fills two buckets with
/// its surrogate pair. This is deterministic and order-sensitive but carries no semantic meaning;
/// it stands in for a real embedding model behind [`Embedder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashEmbedder {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    #[inline]
    fn embed(&self, text: &str) -> Vector {
        let mut buckets = vec![0.0_f32; self.dimension];
        for (i, unit) in text.encode_utf16().enumerate() {
            buckets[i % self.dimension] += f32::from(unit);
        }
        buckets
    }

    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }
}
