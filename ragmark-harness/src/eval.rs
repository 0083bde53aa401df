use anyhow::Context;
use ragmark_embeddings::Embedder;
use ragmark_retrieval::l2_normalize;
use regex_lite::Regex;
use std::sync::Arc;

/// Per-response evaluation output
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// Whether the response cites at least one retrieved article
    pub grounded: bool,

    /// Unit-length embedding of the response, for later pairwise agreement
    pub response_vec: Vec<f32>,
}

/// Scores generated responses for groundedness and embeds them for
/// cross-trial agreement aggregation.
pub struct Evaluator {
    embedder: Arc<dyn Embedder>,
    citation: Regex,
}

impl Evaluator {
    pub fn new(embedder: Arc<dyn Embedder>) -> anyhow::Result<Self> {
        let citation = Regex::new(r"\[([A-Za-z]+-\d+)\]").context("compile citation pattern")?;
        Ok(Self { embedder, citation })
    }

    /// Evaluate one response against the ids that were retrieved for it.
    pub fn evaluate(
        &self,
        response: &str,
        retrieved_ids: &[String],
    ) -> anyhow::Result<EvalOutcome> {
        let cited = self.cited_ids(response);
        let grounded = retrieved_ids
            .iter()
            .any(|id| cited.iter().any(|c| c == id) || mentions_id(response, id));

        let mut response_vec = self.embedder.encode_one(response)?;
        l2_normalize(&mut response_vec);

        Ok(EvalOutcome {
            grounded,
            response_vec,
        })
    }

    /// Article ids cited in bracket form, e.g. `[KA-01000]`.
    pub fn cited_ids(&self, response: &str) -> Vec<String> {
        self.citation
            .captures_iter(response)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// Whether an article id appears verbatim in the response.
///
/// A match must sit on token boundaries on both sides: the preceding
/// character may not be alphanumeric (`A-1` must not match inside `KA-1`)
/// and the following character may not be a digit (`KA-1` must not match
/// inside `KA-12`).
fn mentions_id(response: &str, id: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    let first_char_len = id.chars().next().map_or(1, char::len_utf8);

    let mut search = 0;
    while let Some(pos) = response[search..].find(id) {
        let start = search + pos;
        let end = start + id.len();
        let lead = response[..start]
            .chars()
            .next_back()
            .is_none_or(|prev| !prev.is_ascii_alphanumeric());
        let trail = response[end..]
            .chars()
            .next()
            .is_none_or(|next| !next.is_ascii_digit());
        if lead && trail {
            return true;
        }
        search = start + first_char_len;
    }
    false
}
