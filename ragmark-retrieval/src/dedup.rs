use crate::vector::VectorIndex;
use log::debug;

/// Collapse near-duplicate documents out of a ranked list.
///
/// Walks the list in rank order and keeps a document only if its cosine
/// similarity to every already-kept document stays strictly below the
/// threshold, so among near-duplicates the best-ranked one survives.
/// Relative order of survivors is preserved and a second pass over the
/// output changes nothing.
pub fn collapse_near_duplicates(
    ranked: &[usize],
    vectors: &VectorIndex,
    threshold: f32,
) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(ranked.len());

    for doc in ranked {
        let distinct = kept
            .iter()
            .all(|survivor| vectors.similarity(*doc, *survivor) < threshold);
        if distinct {
            kept.push(*doc);
        }
    }

    if kept.len() < ranked.len() {
        debug!(
            "Deduplication dropped {} of {} candidates",
            ranked.len() - kept.len(),
            ranked.len()
        );
    }

    kept
}
