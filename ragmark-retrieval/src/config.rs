use serde::{Deserialize, Serialize};

/// Which scoring signal(s) drive candidate selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// BM25 only
    Lexical,
    /// Embedding similarity only
    Dense,
    /// Both signals combined with reciprocal rank fusion
    Hybrid,
}

/// Configuration for the retrieval pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages to return per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Retrieval mode: lexical, dense, or hybrid
    #[serde(default = "default_mode")]
    pub mode: RetrievalMode,

    /// Re-select candidates with maximal marginal relevance
    #[serde(default)]
    pub mmr_enabled: bool,

    /// MMR trade-off: 1.0 is pure relevance, 0.0 is pure diversity
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f32,

    /// Collapse near-duplicate passages before returning
    #[serde(default)]
    pub dedup_enabled: bool,

    /// Cosine similarity at or above which two passages count as duplicates
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,

    /// RRF constant k (higher = less emphasis on top ranks)
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,

    /// Candidates fetched per signal, as a multiple of top_k
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Safety margin kept before dedup when MMR is disabled, as a multiple of top_k
    #[serde(default = "default_truncate_factor")]
    pub truncate_factor: usize,
}

fn default_top_k() -> usize {
    3
}

fn default_mode() -> RetrievalMode {
    RetrievalMode::Hybrid
}

fn default_mmr_lambda() -> f32 {
    0.7
}

fn default_dedup_threshold() -> f32 {
    0.92
}

fn default_rrf_k() -> u32 {
    60
}

fn default_overfetch_factor() -> usize {
    4
}

fn default_truncate_factor() -> usize {
    2
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            mode: default_mode(),
            mmr_enabled: false,
            mmr_lambda: default_mmr_lambda(),
            dedup_enabled: false,
            dedup_threshold: default_dedup_threshold(),
            rrf_k: default_rrf_k(),
            overfetch_factor: default_overfetch_factor(),
            truncate_factor: default_truncate_factor(),
        }
    }
}

impl RetrievalConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be > 0".to_string());
        }

        if self.mmr_lambda < 0.0 || self.mmr_lambda > 1.0 {
            return Err(format!(
                "mmr_lambda must be in [0.0, 1.0], got {}",
                self.mmr_lambda
            ));
        }

        if self.dedup_threshold < 0.0 || self.dedup_threshold > 1.0 {
            return Err(format!(
                "dedup_threshold must be in [0.0, 1.0], got {}",
                self.dedup_threshold
            ));
        }

        if self.rrf_k == 0 {
            return Err("rrf_k must be > 0".to_string());
        }

        if self.overfetch_factor == 0 {
            return Err("overfetch_factor must be > 0".to_string());
        }

        if self.truncate_factor == 0 {
            return Err("truncate_factor must be > 0".to_string());
        }

        Ok(())
    }
}
