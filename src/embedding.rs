//! Embedding provider trait and similarity helper.
//!
//! Defines the [`Embedder`] trait the engine consumes to turn query text into
//! a vector. Concrete backends (ONNX runtimes, remote APIs) live with the
//! calling application; this crate only ships the boundary and the cosine
//! helper the in-memory index uses.

use anyhow::Result;
use async_trait::async_trait;

/// Converts text to a fixed-length embedding vector.
///
/// Implementations must be `Send + Sync`; the selector may be invoked from
/// several worker tasks against one shared embedder.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text`. The returned vector's length must equal [`Embedder::dims`].
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
