use log::debug;

/// Document index paired with its raw signal score
pub type Candidate = (usize, f32);

/// Rank assigned to documents absent from a candidate list. Large enough
/// that their reciprocal contribution is effectively zero while keeping
/// every document addressable in the fused ordering.
const MISSING_RANK: u64 = 1_000_000_000;

/// Assign a 1-based rank to every document from one signal's candidates.
///
/// Candidates are ordered by descending score with ties broken by ascending
/// document index, so equal scores always rank the same way. Documents not
/// in the candidate list get [`MISSING_RANK`].
fn assign_ranks(candidates: &[Candidate], doc_count: usize) -> Vec<u64> {
    let mut ordered = candidates.to_vec();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut ranks = vec![MISSING_RANK; doc_count];
    for (position, (doc, _)) in ordered.iter().enumerate() {
        ranks[*doc] = position as u64 + 1;
    }
    ranks
}

/// Fused RRF score for every document in the corpus.
///
/// RRF(d) = 1 / (k + rank_lex(d)) + 1 / (k + rank_dense(d))
/// where k dampens the dominance of top ranks (typically 60).
pub(crate) fn rrf_scores(
    lexical: &[Candidate],
    dense: &[Candidate],
    doc_count: usize,
    rrf_k: u32,
) -> Vec<f32> {
    let lexical_ranks = assign_ranks(lexical, doc_count);
    let dense_ranks = assign_ranks(dense, doc_count);

    let k = f64::from(rrf_k);
    (0..doc_count)
        .map(|doc| {
            let fused = 1.0 / (k + lexical_ranks[doc] as f64)
                + 1.0 / (k + dense_ranks[doc] as f64);
            fused as f32
        })
        .collect()
}

/// Reciprocal Rank Fusion of the lexical and dense candidate lists.
///
/// Returns the union of both lists ordered by descending fused score,
/// ties broken by ascending document index. Documents missing from one
/// list still receive that signal's sentinel-rank contribution, so the
/// fused score depends only on ranks, never on raw score magnitudes.
pub fn rrf_fuse(
    lexical: &[Candidate],
    dense: &[Candidate],
    doc_count: usize,
    rrf_k: u32,
) -> Vec<usize> {
    debug!(
        "RRF fusion: {} lexical + {} dense candidates",
        lexical.len(),
        dense.len()
    );

    let fused = rrf_scores(lexical, dense, doc_count, rrf_k);

    let mut in_union = vec![false; doc_count];
    for (doc, _) in lexical.iter().chain(dense.iter()) {
        in_union[*doc] = true;
    }

    let mut ranked: Vec<usize> = (0..doc_count).filter(|doc| in_union[*doc]).collect();
    ranked.sort_by(|a, b| fused[*b].total_cmp(&fused[*a]).then(a.cmp(b)));

    debug!("RRF produced {} fused candidates", ranked.len());
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fuses_agreeing_signals() {
        let lexical = vec![(0, 3.0), (1, 2.0), (2, 1.0)];
        let dense = vec![(1, 0.9), (0, 0.8), (2, 0.1)];

        // Ranks: doc 0 -> (1, 2), doc 1 -> (2, 1), doc 2 -> (3, 3).
        // Docs 0 and 1 tie on fused score, so the lower index wins.
        let ranked = rrf_fuse(&lexical, &dense, 3, 60);
        assert_eq!(ranked, vec![0, 1, 2]);
    }

    #[test]
    fn test_single_signal_rank_beats_two_sentinels() {
        // Doc 1 is rank 1 in dense only, doc 2 is rank 1 in lexical only.
        // Both fuse to 1/(k+1) + 1/(k+sentinel); the tie goes to doc 1.
        let lexical = vec![(2, 1.0)];
        let dense = vec![(1, 1.0)];

        let ranked = rrf_fuse(&lexical, &dense, 3, 60);
        assert_eq!(ranked, vec![1, 2]);
    }

    #[test]
    fn test_doc_in_both_lists_outranks_doc_in_one() {
        // Doc 0 is last in both lists, doc 1 is first in one list only.
        // Two middling ranks beat one good rank plus a sentinel.
        let lexical = vec![(1, 5.0), (0, 1.0)];
        let dense = vec![(0, 0.4)];

        let ranked = rrf_fuse(&lexical, &dense, 2, 60);
        assert_eq!(ranked, vec![0, 1]);
    }

    #[test]
    fn test_union_excludes_unlisted_documents() {
        let lexical = vec![(0, 2.0)];
        let dense = vec![(3, 0.5)];

        let ranked = rrf_fuse(&lexical, &dense, 5, 60);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.contains(&0));
        assert!(ranked.contains(&3));
    }

    #[test]
    fn test_empty_candidates() {
        let ranked = rrf_fuse(&[], &[], 4, 60);
        assert_eq!(ranked, Vec::<usize>::new());
    }

    #[test]
    fn test_assign_ranks_tie_break_by_index() {
        // Docs 1 and 2 share a score; the lower index must rank first.
        let ranks = assign_ranks(&[(2, 0.5), (1, 0.5), (0, 0.9)], 4);
        assert_eq!(ranks[0], 1);
        assert_eq!(ranks[1], 2);
        assert_eq!(ranks[2], 3);
        assert_eq!(ranks[3], MISSING_RANK);
    }

    #[test]
    fn test_rank_order_invariant_to_input_order() {
        let forward = assign_ranks(&[(0, 3.0), (1, 2.0), (2, 1.0)], 3);
        let shuffled = assign_ranks(&[(2, 1.0), (0, 3.0), (1, 2.0)], 3);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_rrf_scores_cover_whole_corpus() {
        let scores = rrf_scores(&[(0, 1.0)], &[], 3, 60);
        assert_eq!(scores.len(), 3);
        // Unlisted docs still get the double-sentinel baseline.
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[1], scores[2]);
    }
}
