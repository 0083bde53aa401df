use anyhow::Context;
use log::info;
use std::fs;
use std::path::Path;

/// One prompt trial: the response and its evaluation
#[derive(Debug, Clone)]
pub struct ResultRow {
    /// Prompt text asked
    pub prompt: String,

    /// Trial number, starting at 0
    pub trial: usize,

    /// Generated response
    pub response: String,

    /// Whether the response cites a retrieved article
    pub grounded: bool,

    /// Ids of the retrieved articles, best first
    pub retrieved: Vec<String>,

    /// Unit-length embedding of the response
    pub response_vec: Vec<f32>,
}

/// Aggregate statistics over a run's rows
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Distinct prompts asked
    pub prompts: usize,

    /// Total trials recorded
    pub rows: usize,

    /// Fraction of trials whose response was grounded
    pub grounded_rate: f32,

    /// Mean cosine similarity over same-prompt response pairs;
    /// absent when no prompt has at least two trials
    pub mean_agreement: Option<f32>,

    /// Fraction of same-prompt response pairs at or above the
    /// similarity threshold; absent when there are no pairs
    pub agreement_above_threshold: Option<f32>,
}

/// Write rows as CSV. The header is always written, so a run with zero
/// rows still produces a well-formed file.
pub fn write_results_csv(path: &Path, rows: &[ResultRow]) -> anyhow::Result<()> {
    let mut out = String::from("prompt,trial,response,grounded,retrieved,resp_vec\n");

    for row in rows {
        let resp_vec = serde_json::to_string(&row.response_vec)
            .context("serialize response vector")?;
        let fields = [
            escape_csv_cell(&row.prompt),
            row.trial.to_string(),
            escape_csv_cell(&row.response),
            if row.grounded { "1" } else { "0" }.to_string(),
            escape_csv_cell(&row.retrieved.join(";")),
            escape_csv_cell(&resp_vec),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    fs::write(path, out).with_context(|| format!("write results {}", path.display()))?;
    info!("Saved {} result rows to {}", rows.len(), path.display());
    Ok(())
}

fn escape_csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Aggregate rows into a run summary.
///
/// Agreement is computed over every pair of responses to the same prompt,
/// pooled across prompts in first-seen prompt order so the float summation
/// is reproducible. Prompts with a single trial contribute no pairs.
pub fn summarize(rows: &[ResultRow], similarity_threshold: f32) -> RunSummary {
    let grounded = rows.iter().filter(|row| row.grounded).count();
    let grounded_rate = if rows.is_empty() {
        0.0
    } else {
        grounded as f32 / rows.len() as f32
    };

    let mut groups: Vec<(&str, Vec<&[f32]>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|group| group.0 == row.prompt) {
            Some(group) => group.1.push(&row.response_vec),
            None => groups.push((row.prompt.as_str(), vec![row.response_vec.as_slice()])),
        }
    }

    let mut pair_sims: Vec<f32> = Vec::new();
    for (_, vecs) in &groups {
        for i in 0..vecs.len() {
            for j in (i + 1)..vecs.len() {
                pair_sims.push(dot(vecs[i], vecs[j]));
            }
        }
    }

    let (mean_agreement, agreement_above_threshold) = if pair_sims.is_empty() {
        (None, None)
    } else {
        let mean = pair_sims.iter().sum::<f32>() / pair_sims.len() as f32;
        let above = pair_sims
            .iter()
            .filter(|sim| **sim >= similarity_threshold)
            .count() as f32
            / pair_sims.len() as f32;
        (Some(mean), Some(above))
    };

    RunSummary {
        prompts: groups.len(),
        rows: rows.len(),
        grounded_rate,
        mean_agreement,
        agreement_above_threshold,
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
