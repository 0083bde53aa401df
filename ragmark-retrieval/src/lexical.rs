use log::debug;
use std::collections::HashMap;

// Okapi BM25 parameters
const K1: f32 = 1.5;
const B: f32 = 0.75;
const EPSILON: f32 = 0.25;

/// Lower-cased whitespace tokenization, applied to documents and queries alike
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// BM25 lexical index built once over the corpus.
///
/// Scoring is a pure function of the statistics collected at build time:
/// identical corpus and query always produce identical scores.
pub struct TextIndex {
    doc_count: usize,
    doc_len: Vec<f32>,
    avgdl: f32,
    postings: HashMap<String, Vec<(u32, u32)>>,
    idf: HashMap<String, f32>,
}

impl TextIndex {
    /// Build the index from the ordered sequence of document texts
    pub fn build(docs: &[String]) -> Self {
        let doc_count = docs.len();
        let mut doc_len = Vec::with_capacity(doc_count);
        let mut postings: HashMap<String, Vec<(u32, u32)>> = HashMap::new();

        for (doc_index, doc) in docs.iter().enumerate() {
            let tokens = tokenize(doc);
            doc_len.push(tokens.len() as f32);

            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *frequencies.entry(token).or_insert(0) += 1;
            }
            for (token, count) in frequencies {
                postings
                    .entry(token)
                    .or_default()
                    .push((doc_index as u32, count));
            }
        }

        let total_len: f32 = doc_len.iter().sum();
        let avgdl = if doc_count > 0 {
            total_len / doc_count as f32
        } else {
            0.0
        };

        let idf = compute_idf(&postings, doc_count);

        debug!(
            "Built BM25 index: {doc_count} documents, {} distinct terms",
            postings.len()
        );

        Self {
            doc_count,
            doc_len,
            avgdl,
            postings,
            idf,
        }
    }

    /// BM25 score of every document against the query tokens.
    ///
    /// Returns one score per document, indexed by document position.
    /// Repeated query tokens contribute once per occurrence. An empty
    /// corpus yields an empty vector, an empty query all zeros.
    pub fn score(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_count];

        for token in query_tokens {
            let Some(entries) = self.postings.get(token) else {
                continue;
            };
            let idf = self.idf.get(token).copied().unwrap_or(0.0);

            for &(doc_index, tf) in entries {
                let doc_index = doc_index as usize;
                let tf = tf as f32;
                let norm = tf + K1 * (1.0 - B + B * self.doc_len[doc_index] / self.avgdl);
                scores[doc_index] += idf * (tf * (K1 + 1.0)) / norm;
            }
        }

        scores
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.doc_count
    }

    /// Check if the index holds no documents
    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }
}

fn compute_idf(
    postings: &HashMap<String, Vec<(u32, u32)>>,
    doc_count: usize,
) -> HashMap<String, f32> {
    let mut idf = HashMap::with_capacity(postings.len());
    if postings.is_empty() {
        return idf;
    }

    let idf_for = |df: usize| (doc_count as f32 - df as f32 + 0.5).ln() - (df as f32 + 0.5).ln();

    // A term's idf depends only on its document frequency, so the average
    // is summed per df bucket in a fixed order; hash iteration order must
    // not leak into scores through float addition.
    let mut df_term_counts = vec![0u32; doc_count + 1];
    for (term, entries) in postings {
        df_term_counts[entries.len()] += 1;
        idf.insert(term.clone(), idf_for(entries.len()));
    }

    let mut idf_sum = 0.0f32;
    for (df, count) in df_term_counts.iter().enumerate() {
        if *count > 0 {
            idf_sum += idf_for(df) * *count as f32;
        }
    }
    let average_idf = idf_sum / postings.len() as f32;

    // Terms appearing in most documents get a negative idf from the formula
    // above. Floor them at a fraction of the average idf, clamped at zero so
    // scores stay non-negative even for degenerate corpora.
    let floor = (EPSILON * average_idf).max(0.0);
    for value in idf.values_mut() {
        if *value < 0.0 {
            *value = floor;
        }
    }

    idf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corpus(docs: &[&str]) -> Vec<String> {
        docs.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Reset  My\tPassword\n"),
            vec!["reset", "my", "password"]
        );
        assert_eq!(tokenize(""), Vec::<String>::new());
    }

    #[test]
    fn test_matching_document_outranks_others() {
        let index = TextIndex::build(&corpus(&[
            "password reset instructions for the portal",
            "health insurance waiver deadline",
            "campus id card replacement fee",
        ]));

        let scores = index.score(&tokenize("password reset"));
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_rare_term_scores_higher_than_common_term() {
        let index = TextIndex::build(&corpus(&[
            "tuition payment tuition deadline",
            "tuition payment options",
            "tuition refunds waitlist",
        ]));

        // "waitlist" appears in one document, "tuition" in every document
        let rare = index.score(&tokenize("waitlist"));
        let common = index.score(&tokenize("tuition"));
        assert!(rare[2] > common[2]);
    }

    #[test]
    fn test_empty_corpus_scores_empty() {
        let index = TextIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.score(&tokenize("anything")), Vec::<f32>::new());
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let index = TextIndex::build(&corpus(&["drop a course", "add a class"]));
        assert_eq!(index.score(&[]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_scores_are_non_negative() {
        // Every term appears in most documents, exercising the idf floor
        let index = TextIndex::build(&corpus(&[
            "portal portal account",
            "portal account help",
            "portal account",
        ]));

        let scores = index.score(&tokenize("portal account help"));
        assert!(scores.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_repeated_query_token_counts_twice() {
        let index = TextIndex::build(&corpus(&[
            "grade appeal steps",
            "housing application",
            "parking permits",
        ]));

        let once = index.score(&tokenize("appeal"));
        let twice = index.score(&tokenize("appeal appeal"));
        assert!(once[0] > 0.0);
        assert!((twice[0] - 2.0 * once[0]).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_scores() {
        let index = TextIndex::build(&corpus(&[
            "leave of absence request",
            "full-time enrollment status",
            "student loans and fafsa",
        ]));

        let query = tokenize("full-time student status");
        assert_eq!(index.score(&query), index.score(&query));
    }
}
