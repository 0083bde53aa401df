/*!
# Ragmark Harness

Experiment harness around [`ragmark_retrieval`]: loads a help-center
knowledge base and a prompt set, retrieves context per prompt, generates
answers through a pluggable backend, and scores every response.

## Pipeline

```text
config.toml
  └─> datasets (knowledge.json, prompts.json)
        └─> Retriever (BM25 + dense + fusion)
              └─> GenerationBackend (dummy | openai)
                    └─> Evaluator (groundedness, response embedding)
                          └─> results.csv + RunSummary
```

## Backends

- **dummy**: canned keyword-matched answers citing the top retrieved
  article. Offline and deterministic per (prompt, seed), so repeated
  trials measure pipeline variance in isolation.
- **openai**: any OpenAI-compatible chat completions endpoint; the API
  key is read from the configured environment variable.

## Example

```rust,no_run
use ragmark_harness::{run_experiment, HarnessConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HarnessConfig::load(Path::new("configs/base.toml"))?;
    let summary = run_experiment(&config).await?;

    println!(
        "{} rows, grounded rate {:.2}",
        summary.rows, summary.grounded_rate
    );
    Ok(())
}
```
*/

mod config;
mod dataset;
mod eval;
mod generate;
mod report;
mod runner;

pub use config::{
    DatasetConfig, EmbeddingConfig, EmbeddingProvider, EvalConfig, GenerationBackendKind,
    GenerationConfig, HarnessConfig, OutputConfig, RunConfig,
};
pub use dataset::{load_knowledge_base, load_prompts};
pub use eval::{EvalOutcome, Evaluator};
pub use generate::{build_backend, DummyBackend, GenerationBackend, OpenAiBackend};
pub use report::{summarize, write_results_csv, ResultRow, RunSummary};
pub use runner::{format_context, run_experiment};
