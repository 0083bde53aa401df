use crate::article::Article;
use serde::{Deserialize, Serialize};

/// Ranked passages returned for one query, with pipeline metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieved {
    /// Query that produced these passages
    pub query: String,

    /// Retrieved articles, best first
    pub passages: Vec<Article>,

    /// Retrieval statistics
    pub stats: RetrievalStats,
}

impl Retrieved {
    /// Number of retrieved passages
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Check if nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

/// Per-query retrieval statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalStats {
    /// Candidates produced by the lexical signal
    pub lexical_candidates: usize,

    /// Candidates produced by the dense signal
    pub dense_candidates: usize,

    /// Candidates after fusion or single-signal selection
    pub fused_candidates: usize,

    /// Near-duplicates removed
    pub deduped: usize,

    /// Total retrieval time in milliseconds
    pub total_time_ms: u64,
}

/// Raw per-document scores from each signal, for inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalScores {
    /// BM25 score per document
    pub lexical: Vec<f32>,

    /// Cosine similarity per document
    pub dense: Vec<f32>,

    /// Reciprocal rank fusion score per document
    pub fused: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_retrieved_len() {
        let retrieved = Retrieved {
            query: "reset password".to_string(),
            passages: vec![Article::new(
                "KA-1",
                "Password resets",
                "Use the self-service portal.",
            )],
            stats: RetrievalStats::default(),
        };

        assert_eq!(retrieved.len(), 1);
        assert!(!retrieved.is_empty());
    }

    #[test]
    fn test_empty_retrieved() {
        let retrieved = Retrieved {
            query: "anything".to_string(),
            passages: Vec::new(),
            stats: RetrievalStats::default(),
        };

        assert!(retrieved.is_empty());
        assert_eq!(retrieved.stats.deduped, 0);
    }
}
