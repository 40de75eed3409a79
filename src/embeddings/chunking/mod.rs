
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A window of the uploaded document, the unit of indexing and citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position of this chunk within the document
    pub index: usize,
    /// The window's words joined by single spaces
    pub text: String,
}

/// Configuration for document chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of words per window
    pub window_size: usize,
    /// Number of words shared by adjacent windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            window_size: 400,
            overlap: 50,
        }
    }
}

impl ChunkingConfig {
    /// Words the window start moves forward between chunks, never less than one
    #[inline]
    pub fn step(&self) -> usize {
        self.effective_window().saturating_sub(self.overlap).max(1)
    }

    fn effective_window(&self) -> usize {
        self.window_size.max(1)
    }
}

/// Split text into whitespace-delimited words
#[inline]
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Split a document into overlapping word windows.
///
/// Returns no chunks for empty or whitespace-only input. A window starts at
/// every multiple of [`ChunkingConfig::step`] before the end of the document,
/// so trailing windows may be short and may lie inside the previous one.
#[inline]
pub fn chunk_document(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let words = tokenize(text);
    let window = config.effective_window();
    let step = config.step();

    let mut chunks = Vec::with_capacity(words.len().div_ceil(step));
    let mut start = 0;
    while start < words.len() {
        let end = (start + window).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += step;
    }

    debug!(
        "Chunked {} words into {} chunks (window {}, step {})",
        words.len(),
        chunks.len(),
        window,
        step
    );

    chunks
}

/// Attach zero-based positions to chunk texts
#[inline]
pub fn build_chunks(texts: Vec<String>) -> Vec<Chunk> {
    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { index, text })
        .collect()
}
