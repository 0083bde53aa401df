use crate::fusion::Candidate;
use crate::vector::VectorIndex;
use std::cmp::Ordering;

/// Greedy Maximal Marginal Relevance selection over a candidate pool.
///
/// Each step picks the unselected candidate maximizing
/// `lambda * relevance - (1 - lambda) * max_sim(candidate, selected)`,
/// where relevance is the candidate's query similarity and the penalty is
/// its highest similarity to anything already selected. The first pick has
/// no penalty; for later picks the penalty keeps its sign, so a candidate
/// opposed to everything selected gains a bonus. Score ties go to the
/// lower document index, so selection is deterministic regardless of pool
/// order.
pub fn mmr_select(
    pool: &[Candidate],
    vectors: &VectorIndex,
    lambda: f32,
    k: usize,
) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(pool.len()));
    let mut picked = vec![false; pool.len()];

    while selected.len() < k && selected.len() < pool.len() {
        let mut best: Option<(usize, f32)> = None;

        for (position, (doc, relevance)) in pool.iter().enumerate() {
            if picked[position] {
                continue;
            }

            let redundancy = selected
                .iter()
                .map(|kept| vectors.similarity(*doc, *kept))
                .reduce(f32::max)
                .unwrap_or(0.0);
            let score = lambda * relevance - (1.0 - lambda) * redundancy;

            let better = match best {
                None => true,
                Some((best_position, best_score)) => match score.total_cmp(&best_score) {
                    Ordering::Greater => true,
                    Ordering::Equal => *doc < pool[best_position].0,
                    Ordering::Less => false,
                },
            };
            if better {
                best = Some((position, score));
            }
        }

        match best {
            Some((position, _)) => {
                picked[position] = true;
                selected.push(pool[position].0);
            }
            None => break,
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ragmark_embeddings::{Embedder, EmbeddingError};

    /// Maps each known text to a fixed vector
    struct StubEmbedder {
        dimension: usize,
    }

    impl Embedder for StubEmbedder {
        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|text| match text.as_str() {
                    // "near" sits at cosine 0.95 to "anchor"; "far" is orthogonal
                    // and "opposite" points straight away from "anchor"
                    "anchor" => vec![1.0, 0.0, 0.0],
                    "near" => vec![0.95, 0.312_249_9, 0.0],
                    "far" => vec![0.0, 0.0, 1.0],
                    "opposite" => vec![-1.0, 0.0, 0.0],
                    _ => vec![0.0; self.dimension],
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    fn index(texts: &[&str]) -> VectorIndex {
        let embedder = StubEmbedder { dimension: 3 };
        let docs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        VectorIndex::build(&embedder, &docs).unwrap()
    }

    #[test]
    fn test_first_pick_is_most_relevant() {
        let vectors = index(&["anchor", "near", "far"]);
        let pool = vec![(0, 0.6), (1, 0.9), (2, 0.3)];

        let selected = mmr_select(&pool, &vectors, 0.7, 1);
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn test_redundancy_penalty_promotes_diverse_document() {
        let vectors = index(&["anchor", "near", "far"]);
        // "near" is almost as relevant as "anchor" but nearly identical to it,
        // so at lambda 0.5 the orthogonal "far" wins the second slot.
        let pool = vec![(0, 1.0), (1, 0.9), (2, 0.3)];

        let selected = mmr_select(&pool, &vectors, 0.5, 3);
        assert_eq!(selected, vec![0, 2, 1]);
    }

    #[test]
    fn test_negative_similarity_grants_a_diversity_bonus() {
        let vectors = index(&["anchor", "opposite", "far"]);
        // After "anchor" is picked, "opposite" carries a penalty of -1.0,
        // which lifts its score (0.35 + 0.3) past the more relevant but
        // merely orthogonal "far" (0.42).
        let pool = vec![(0, 1.0), (1, 0.5), (2, 0.6)];

        let selected = mmr_select(&pool, &vectors, 0.7, 2);
        assert_eq!(selected, vec![0, 1]);
    }

    #[test]
    fn test_lambda_one_is_pure_relevance() {
        let vectors = index(&["anchor", "near", "far"]);
        let pool = vec![(0, 1.0), (1, 0.9), (2, 0.3)];

        let selected = mmr_select(&pool, &vectors, 1.0, 3);
        assert_eq!(selected, vec![0, 1, 2]);
    }

    #[test]
    fn test_selection_bounded_by_k_and_pool() {
        let vectors = index(&["anchor", "near", "far"]);
        let pool = vec![(0, 1.0), (1, 0.9), (2, 0.3)];

        assert_eq!(mmr_select(&pool, &vectors, 0.7, 2).len(), 2);
        assert_eq!(mmr_select(&pool, &vectors, 0.7, 10).len(), 3);
    }

    #[test]
    fn test_score_tie_goes_to_lower_document_index() {
        let vectors = index(&["anchor", "near", "far"]);
        let pool = vec![(2, 0.5), (0, 0.5)];

        let selected = mmr_select(&pool, &vectors, 1.0, 1);
        assert_eq!(selected, vec![0]);
    }

    #[test]
    fn test_empty_pool() {
        let vectors = index(&["anchor"]);
        assert_eq!(mmr_select(&[], &vectors, 0.7, 3), Vec::<usize>::new());
    }
}
