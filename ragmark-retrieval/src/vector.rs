use crate::error::{Result, RetrievalError};
use log::debug;
use ragmark_embeddings::Embedder;

/// Normalize a vector to unit length in place.
///
/// An all-zero vector is left unchanged rather than dividing by zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector {
            *value /= magnitude;
        }
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Dense embedding table built once over the corpus.
///
/// Every document text is embedded through the injected [`Embedder`] and
/// normalized to unit length, so dot products against stored rows are
/// cosine similarities. Query vectors must be normalized by the caller.
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Embed and store every document text, in corpus order.
    ///
    /// Fails if the embedding provider errors or returns a vector of the
    /// wrong dimensionality; there is no degraded mode.
    pub fn build(embedder: &dyn Embedder, docs: &[String]) -> Result<Self> {
        let dimension = embedder.dimension();

        if docs.is_empty() {
            return Ok(Self {
                vectors: Vec::new(),
                dimension,
            });
        }

        let embedded = embedder.encode(docs)?;
        if embedded.len() != docs.len() {
            return Err(RetrievalError::Embedding(
                ragmark_embeddings::EmbeddingError::EmbeddingGeneration(format!(
                    "expected {} embeddings, got {}",
                    docs.len(),
                    embedded.len()
                )),
            ));
        }

        let mut vectors = Vec::with_capacity(embedded.len());
        for mut vector in embedded {
            if vector.len() != dimension {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            l2_normalize(&mut vector);
            vectors.push(vector);
        }

        debug!(
            "Built vector index: {} documents, dimension {dimension}",
            vectors.len()
        );

        Ok(Self { vectors, dimension })
    }

    /// Cosine similarity of every document against a unit-normalized query vector.
    ///
    /// Returns one score per document, indexed by document position.
    pub fn score(&self, query_vec: &[f32]) -> Vec<f32> {
        self.vectors.iter().map(|v| dot(v, query_vec)).collect()
    }

    /// Cosine similarity between two stored documents
    pub fn similarity(&self, i: usize, j: usize) -> f32 {
        dot(&self.vectors[i], &self.vectors[j])
    }

    /// Dimension of the stored vectors
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Check if the index holds no documents
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ragmark_embeddings::EmbeddingError;

    /// Returns a fixed vector per known text
    struct StubEmbedder {
        dimension: usize,
    }

    impl StubEmbedder {
        fn vector_for(&self, text: &str) -> Vec<f32> {
            match text {
                "a" => vec![2.0, 0.0, 0.0],
                "b" => vec![0.0, 3.0, 0.0],
                "c" => vec![1.0, 1.0, 0.0],
                _ => vec![0.0; 3],
            }
        }
    }

    impl Embedder for StubEmbedder {
        fn encode(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| self.vector_for(t)).collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn encode(&self, _texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::EmbeddingGeneration("model offline".to_string()))
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_build_normalizes_vectors() {
        let embedder = StubEmbedder { dimension: 3 };
        let index = VectorIndex::build(&embedder, &docs(&["a", "b"])).unwrap();

        // "a" started at magnitude 2, "b" at magnitude 3
        assert_eq!(index.score(&[1.0, 0.0, 0.0]), vec![1.0, 0.0]);
        assert_eq!(index.score(&[0.0, 1.0, 0.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_similarity_between_documents() {
        let embedder = StubEmbedder { dimension: 3 };
        let index = VectorIndex::build(&embedder, &docs(&["a", "b", "c"])).unwrap();

        assert!(index.similarity(0, 1).abs() < 1e-6);
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((index.similarity(0, 2) - expected).abs() < 1e-6);
        assert_eq!(index.similarity(0, 2), index.similarity(2, 0));
    }

    #[test]
    fn test_zero_vector_document_stays_zero() {
        let embedder = StubEmbedder { dimension: 3 };
        let index = VectorIndex::build(&embedder, &docs(&["unknown"])).unwrap();

        assert_eq!(index.score(&[1.0, 0.0, 0.0]), vec![0.0]);
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        // Provider claims dimension 4 but produces 3-long vectors
        let embedder = StubEmbedder { dimension: 4 };
        let result = VectorIndex::build(&embedder, &docs(&["a"]));

        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_embedding_failure_propagates() {
        let result = VectorIndex::build(&FailingEmbedder, &docs(&["a"]));
        assert!(matches!(result, Err(RetrievalError::Embedding(_))));
    }

    #[test]
    fn test_empty_corpus() {
        let embedder = StubEmbedder { dimension: 3 };
        let index = VectorIndex::build(&embedder, &[]).unwrap();

        assert!(index.is_empty());
        assert_eq!(index.score(&[1.0, 0.0, 0.0]), Vec::<f32>::new());
    }

    #[test]
    fn test_l2_normalize_zero_vector_guard() {
        let mut zero = vec![0.0f32; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0, 0.0]);

        let mut vector = vec![3.0f32, 4.0];
        l2_normalize(&mut vector);
        assert!((vector[0] - 0.6).abs() < 1e-6);
        assert!((vector[1] - 0.8).abs() < 1e-6);
    }
}
