use crate::error::EmbeddingError;
use crate::{Embedder, HASHING_EMBEDDING_DIM};
use log::debug;
use sha2::{Digest, Sha256};

/// Deterministic embedding provider based on signed token feature hashing.
///
/// Each whitespace token of the lower-cased input is hashed into a bucket of
/// the output vector with a digest-derived sign, and the result is
/// L2-normalized. The same text always maps to the same unit vector on every
/// platform, which makes this provider suitable for tests and for offline
/// evaluation runs where downloading a real model is not an option. It
/// captures token overlap, not meaning.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text.to_lowercase().split_whitespace() {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_be_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        // Token-free text stays the zero vector
        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_EMBEDDING_DIM)
    }
}

impl Embedder for HashingEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!("Hash-embedding {} texts", texts.len());
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
