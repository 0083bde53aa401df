use crate::config::HarnessConfig;
use crate::dataset::{load_knowledge_base, load_prompts};
use crate::eval::Evaluator;
use crate::generate::build_backend;
use crate::report::{summarize, write_results_csv, ResultRow, RunSummary};
use anyhow::Context;
use log::info;
use ragmark_retrieval::{Article, Retriever};
use std::fs;

/// Format retrieved passages into the context block handed to generation.
///
/// One `[{id}] {title}: {answer}` line per passage, blank-line separated.
pub fn format_context(passages: &[Article]) -> String {
    passages
        .iter()
        .map(|article| {
            format!(
                "[{}] {}: {}",
                article.article_number, article.title, article.answer
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n")
}

/// Run the configured experiment end to end.
///
/// Loads datasets, indexes the knowledge base, asks every prompt for the
/// configured number of trials, evaluates each response, and writes
/// `results.csv` under `{out_dir}/{run name}/`.
pub async fn run_experiment(config: &HarnessConfig) -> anyhow::Result<RunSummary> {
    let embedder = config.embedding.build_embedder()?;
    let corpus = load_knowledge_base(&config.datasets.knowledge_path)?;
    let prompts = load_prompts(&config.datasets.prompts_path)?;

    let retriever = Retriever::build(config.retrieval.clone(), corpus, embedder.clone())?;
    let backend = build_backend(&config.generation)?;
    // Responses are embedded with the same provider as the corpus.
    let evaluator = Evaluator::new(embedder)?;

    info!(
        "Starting run '{}': {} prompts x {} trials",
        config.run.name,
        prompts.len(),
        config.run.trials_per_prompt
    );

    let mut rows: Vec<ResultRow> =
        Vec::with_capacity(prompts.len() * config.run.trials_per_prompt);
    for prompt in &prompts {
        for trial in 0..config.run.trials_per_prompt {
            // Each trial is a fresh session; retrieval is deterministic,
            // so trials differ only in what generation does with it.
            let retrieved = retriever.retrieve(prompt)?;
            let context = format_context(&retrieved.passages);
            let retrieved_ids: Vec<String> = retrieved
                .passages
                .iter()
                .map(|article| article.article_number.clone())
                .collect();

            let response = backend
                .generate(prompt, &context)
                .await
                .with_context(|| format!("generate response for '{prompt}'"))?;

            let outcome = evaluator.evaluate(&response, &retrieved_ids)?;
            rows.push(ResultRow {
                prompt: prompt.clone(),
                trial,
                response,
                grounded: outcome.grounded,
                retrieved: retrieved_ids,
                response_vec: outcome.response_vec,
            });
        }
    }

    let run_dir = config.output.out_dir.join(&config.run.name);
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create run directory {}", run_dir.display()))?;
    write_results_csv(&run_dir.join("results.csv"), &rows)?;

    let summary = summarize(&rows, config.eval.similarity_threshold);
    info!(
        "Run '{}' complete: {} rows, grounded rate {:.2}",
        config.run.name, summary.rows, summary.grounded_rate
    );
    Ok(summary)
}
