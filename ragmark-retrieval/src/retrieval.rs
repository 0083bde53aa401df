use crate::article::Article;
use crate::config::{RetrievalConfig, RetrievalMode};
use crate::dedup::collapse_near_duplicates;
use crate::error::{Result, RetrievalError};
use crate::fusion::{rrf_fuse, rrf_scores, Candidate};
use crate::lexical::{tokenize, TextIndex};
use crate::mmr::mmr_select;
use crate::result::{Retrieved, RetrievalStats, SignalScores};
use crate::vector::{l2_normalize, VectorIndex};
use log::{debug, info};
use ragmark_embeddings::Embedder;
use std::sync::Arc;
use std::time::Instant;

/// Rank every document by score, best first, ties to the lower index,
/// keeping at most `limit` candidates. Zero-score documents still rank.
pub fn top_candidates(scores: &[f32], limit: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = scores.iter().copied().enumerate().collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    candidates.truncate(limit);
    candidates
}

/// Hybrid retriever over a fixed corpus of help-center articles.
///
/// Builds a BM25 text index and a dense vector index once, then answers
/// queries by scoring both signals, fusing with reciprocal rank fusion,
/// and optionally re-ranking with MMR and collapsing near-duplicates.
/// Retrieval is deterministic: the same corpus, configuration, and query
/// always produce the same passages in the same order.
pub struct Retriever {
    config: RetrievalConfig,
    corpus: Vec<Article>,
    text_index: TextIndex,
    vector_index: VectorIndex,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Index the corpus with the given configuration and embedding provider.
    ///
    /// Fails on an invalid configuration or if embedding the corpus fails.
    pub fn build(
        config: RetrievalConfig,
        corpus: Vec<Article>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        config.validate().map_err(RetrievalError::InvalidConfig)?;

        info!("Indexing {} articles for retrieval", corpus.len());

        let docs: Vec<String> = corpus.iter().map(Article::document_text).collect();
        let text_index = TextIndex::build(&docs);
        let vector_index = VectorIndex::build(embedder.as_ref(), &docs)?;

        Ok(Self {
            config,
            corpus,
            text_index,
            vector_index,
            embedder,
        })
    }

    /// Retrieve the best passages for a query.
    pub fn retrieve(&self, query: &str) -> Result<Retrieved> {
        let start = Instant::now();
        let mut stats = RetrievalStats::default();

        debug!("Retrieving for: '{query}'");

        // Stage 1: query representations
        let query_vec = self.embed_query(query)?;
        let query_tokens = tokenize(query);

        // Stage 2: score both signals over the whole corpus
        let lexical_scores = self.text_index.score(&query_tokens);
        let dense_scores = self.vector_index.score(&query_vec);

        // Stage 3: over-fetch candidates per signal so fusion and the
        // diversity passes have slack beyond top_k
        let fetch = self.config.top_k * self.config.overfetch_factor;
        let lexical = top_candidates(&lexical_scores, fetch);
        let dense = top_candidates(&dense_scores, fetch);
        stats.lexical_candidates = lexical.len();
        stats.dense_candidates = dense.len();

        // Stage 4: fuse or pass through, per mode
        let mut ranked: Vec<usize> = match self.config.mode {
            RetrievalMode::Lexical => lexical.iter().map(|(doc, _)| *doc).collect(),
            RetrievalMode::Dense => dense.iter().map(|(doc, _)| *doc).collect(),
            RetrievalMode::Hybrid => {
                rrf_fuse(&lexical, &dense, self.corpus.len(), self.config.rrf_k)
            }
        };
        stats.fused_candidates = ranked.len();

        // Stage 5: MMR re-ranking, or plain truncation of the pool
        if self.config.mmr_enabled {
            let pool: Vec<Candidate> = ranked
                .iter()
                .map(|doc| (*doc, dense_scores[*doc]))
                .collect();
            ranked = mmr_select(
                &pool,
                &self.vector_index,
                self.config.mmr_lambda,
                self.config.top_k,
            );
        } else {
            ranked.truncate(self.config.top_k * self.config.truncate_factor);
        }

        // Stage 6: near-duplicate collapse; may leave fewer than top_k
        if self.config.dedup_enabled {
            let kept =
                collapse_near_duplicates(&ranked, &self.vector_index, self.config.dedup_threshold);
            stats.deduped = ranked.len() - kept.len();
            ranked = kept;
        }

        // Stage 7: final cut and article resolution
        ranked.truncate(self.config.top_k);
        let passages: Vec<Article> = ranked.iter().map(|doc| self.corpus[*doc].clone()).collect();

        stats.total_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Retrieval completed in {}ms, returned {} passages",
            stats.total_time_ms,
            passages.len()
        );

        Ok(Retrieved {
            query: query.to_string(),
            passages,
            stats,
        })
    }

    /// Raw per-document scores from every signal, for score inspection.
    ///
    /// Unlike [`retrieve`](Self::retrieve) nothing is truncated: each list
    /// covers the whole corpus, and fusion ranks every document.
    pub fn signal_scores(&self, query: &str) -> Result<SignalScores> {
        let query_vec = self.embed_query(query)?;

        let lexical = self.text_index.score(&tokenize(query));
        let dense = self.vector_index.score(&query_vec);

        let lexical_candidates: Vec<Candidate> = lexical.iter().copied().enumerate().collect();
        let dense_candidates: Vec<Candidate> = dense.iter().copied().enumerate().collect();
        let fused = rrf_scores(
            &lexical_candidates,
            &dense_candidates,
            self.corpus.len(),
            self.config.rrf_k,
        );

        Ok(SignalScores {
            lexical,
            dense,
            fused,
        })
    }

    /// Embed and unit-normalize the query text.
    ///
    /// A query that embeds to the zero vector is kept as-is; it scores
    /// zero against every document rather than failing retrieval.
    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut query_vec = self.embedder.encode_one(query)?;
        if query_vec.len() != self.vector_index.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.vector_index.dimension(),
                actual: query_vec.len(),
            });
        }
        l2_normalize(&mut query_vec);
        Ok(query_vec)
    }

    /// Indexed articles, in corpus order
    pub fn corpus(&self) -> &[Article] {
        &self.corpus
    }

    /// Get configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }
}
