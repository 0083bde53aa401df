//! # Ragmark Embeddings
//!
//! This crate provides the text embedding capability for the ragmark
//! retrieval pipeline. The pipeline never talks to a concrete model;
//! it is handed an [`Embedder`] and stays agnostic about where the
//! vectors come from.
//!
//! ## Providers
//!
//! - [`FastembedEmbedder`]: real embeddings from a local ONNX model via
//!   fastembed-rs (behind the `fastembed` cargo feature)
//! - [`HashingEmbedder`]: deterministic signed token-feature hashing,
//!   for tests and offline evaluation runs
//!
//! ## Example
//!
//! ```
//! use ragmark_embeddings::{Embedder, HashingEmbedder};
//!
//! let embedder = HashingEmbedder::default();
//! let vectors = embedder.encode(&["How do I reset my password?".to_string()])?;
//! assert_eq!(vectors[0].len(), embedder.dimension());
//! # Ok::<(), ragmark_embeddings::EmbeddingError>(())
//! ```

mod error;
mod hashing;
#[cfg(feature = "fastembed")]
mod service;

pub use error::EmbeddingError;
pub use hashing::HashingEmbedder;
#[cfg(feature = "fastembed")]
pub use service::EmbeddingModelType;
#[cfg(feature = "fastembed")]
pub use service::FastembedConfig;
#[cfg(feature = "fastembed")]
pub use service::FastembedEmbedder;

/// Default embedding dimension for all-MiniLM-L6-v2
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default dimension for the hashing provider
pub const HASHING_EMBEDDING_DIM: usize = 256;

/// Text embedding capability.
///
/// Implementations must be deterministic for a fixed model/version so that
/// retrieval stays reproducible across runs.
pub trait Embedder: Send + Sync {
    /// Generate embeddings for a list of texts, one vector per input
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Generate a single embedding for a text
    fn encode_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.encode(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingGeneration("no embedding produced".to_string()))
    }

    /// Dimension of the vectors produced by this provider
    fn dimension(&self) -> usize;
}
