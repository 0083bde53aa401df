/*!
# Ragmark Retrieval

Hybrid retrieval over a help-center knowledge base combining:
- **Lexical search** via Okapi BM25 over whitespace tokens
- **Dense search** via embedding cosine similarity
- **Reciprocal Rank Fusion (RRF)** for signal combination
- **MMR re-ranking** and **near-duplicate collapse** for result diversity

## Features

- **Multi-stage pipeline**: BM25 + dense scoring → fusion → MMR → dedup
- **Selectable modes**: lexical-only, dense-only, or hybrid fusion
- **Deterministic**: same corpus, config, and query always rank identically
- **Pluggable embeddings**: any [`ragmark_embeddings::Embedder`] implementation

## Architecture

```text
Query
  ├─> BM25 scoring (text index)
  │     └─> Top-K candidates
  ├─> Dense scoring (vector index)
  │     └─> Top-K candidates
  └─> Fusion (reciprocal rank)
        └─> MMR re-ranking (optional)
              └─> Near-duplicate collapse (optional)
                    └─> Final top-k passages
```

## Example

```rust,no_run
use ragmark_embeddings::HashingEmbedder;
use ragmark_retrieval::{Article, RetrievalConfig, Retriever};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let corpus = vec![Article::new(
        "KA-01027",
        "Resetting your password",
        "Use the self-service portal and follow the emailed link.",
    )];

    let config = RetrievalConfig::default();
    let retriever = Retriever::build(config, corpus, Arc::new(HashingEmbedder::default()))?;
    let retrieved = retriever.retrieve("how do I reset my password?")?;

    for (i, article) in retrieved.passages.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, article.article_number, article.title);
    }

    Ok(())
}
```

## Ranking rules

- Candidate and fused orderings break score ties by ascending document
  index, so results never depend on iteration order.
- Documents missing from one signal's list still fuse via a sentinel rank.
- Deduplication keeps the best-ranked member of each near-duplicate group
  and never refills, so fewer than `top_k` passages may come back.
*/

mod article;
mod config;
mod dedup;
mod error;
mod fusion;
mod lexical;
mod mmr;
mod result;
mod retrieval;
mod vector;

pub use article::Article;
pub use config::{RetrievalConfig, RetrievalMode};
pub use dedup::collapse_near_duplicates;
pub use error::{Result, RetrievalError};
pub use fusion::{rrf_fuse, Candidate};
pub use lexical::{tokenize, TextIndex};
pub use mmr::mmr_select;
pub use result::{Retrieved, RetrievalStats, SignalScores};
pub use retrieval::{top_candidates, Retriever};
pub use vector::{l2_normalize, VectorIndex};
