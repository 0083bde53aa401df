use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use ragmark_harness::{load_knowledge_base, run_experiment, HarnessConfig};
use ragmark_retrieval::{top_candidates, Article, Retriever};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "ragmark",
    about = "RAG evaluation harness for a university help-center knowledge base"
)]
struct Cli {
    /// Path to the experiment configuration
    #[arg(
        short,
        long,
        global = true,
        default_value = "configs/base.toml",
        value_name = "PATH"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the configured experiment and write results
    Run,

    /// Retrieve passages for a single query
    Search(SearchArgs),

    /// Show per-signal scores for a single query
    Scores(ScoresArgs),
}

#[derive(Debug, Parser)]
struct SearchArgs {
    /// Query text
    #[arg(value_name = "QUERY")]
    query: String,

    /// Number of passages to return (defaults to the configured top_k)
    #[arg(short = 'n', long)]
    top_k: Option<usize>,
}

#[derive(Debug, Parser)]
struct ScoresArgs {
    /// Query text
    #[arg(value_name = "QUERY")]
    query: String,

    /// Rows shown per signal
    #[arg(short = 'n', long, default_value_t = 5)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = HarnessConfig::load(&cli.config)?;

    match cli.command {
        Command::Run => run_cmd(config).await,
        Command::Search(args) => search_cmd(config, args),
        Command::Scores(args) => scores_cmd(config, args),
    }
}

async fn run_cmd(config: HarnessConfig) -> Result<()> {
    println!(
        "{} Running experiment '{}'",
        "▶".bright_blue(),
        config.run.name.bright_cyan()
    );

    let summary = run_experiment(&config).await?;

    println!("\n{} Run complete", "✓".bright_green());
    println!("  Prompts: {}", summary.prompts.to_string().bright_cyan());
    println!("  Trials: {}", summary.rows.to_string().bright_cyan());
    println!(
        "  Grounded rate: {}",
        format!("{:.2}", summary.grounded_rate).bright_cyan()
    );
    match summary.mean_agreement {
        Some(mean) => println!(
            "  Mean agreement: {}",
            format!("{mean:.3}").bright_cyan()
        ),
        None => println!("  Mean agreement: {}", "n/a (single trial)".bright_black()),
    }
    if let Some(above) = summary.agreement_above_threshold {
        println!(
            "  Agreement >= {:.2}: {}",
            config.eval.similarity_threshold,
            format!("{above:.2}").bright_cyan()
        );
    }

    Ok(())
}

fn search_cmd(mut config: HarnessConfig, args: SearchArgs) -> Result<()> {
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }

    let retriever = build_retriever(&config)?;
    let retrieved = retriever.retrieve(&args.query)?;

    if retrieved.is_empty() {
        println!("{} No passages found", "✗".bright_red());
        return Ok(());
    }

    println!(
        "{} Retrieved {} passages in {}ms\n",
        "✓".bright_green(),
        retrieved.len().to_string().bright_cyan(),
        retrieved.stats.total_time_ms.to_string().bright_cyan()
    );

    for (i, article) in retrieved.passages.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            (i + 1).to_string().bright_yellow(),
            article.article_number.bright_cyan(),
            article.title
        );
        println!("   {}", article.answer.dimmed());
        println!();
    }

    Ok(())
}

fn scores_cmd(config: HarnessConfig, args: ScoresArgs) -> Result<()> {
    let retriever = build_retriever(&config)?;

    if retriever.corpus().is_empty() {
        println!("{} Knowledge base is empty", "✗".bright_red());
        return Ok(());
    }

    let scores = retriever.signal_scores(&args.query)?;

    println!(
        "{} Signal scores for '{}'\n",
        "▶".bright_blue(),
        args.query.bright_cyan()
    );
    print_signal_table("BM25", &scores.lexical, retriever.corpus(), args.limit);
    print_signal_table("Dense", &scores.dense, retriever.corpus(), args.limit);
    print_signal_table("Fused (RRF)", &scores.fused, retriever.corpus(), args.limit);

    Ok(())
}

fn print_signal_table(name: &str, scores: &[f32], corpus: &[Article], limit: usize) {
    println!("{}", format!("{name}:").bright_blue());
    for (rank, (doc, score)) in top_candidates(scores, limit).into_iter().enumerate() {
        let article = &corpus[doc];
        println!(
            "  {}. {} [{}] {}",
            (rank + 1).to_string().bright_yellow(),
            format!("{score:.4}").bright_green(),
            article.article_number.bright_cyan(),
            article.title
        );
    }
    println!();
}

fn build_retriever(config: &HarnessConfig) -> Result<Retriever> {
    let embedder = config.embedding.build_embedder()?;
    let corpus = load_knowledge_base(&config.datasets.knowledge_path)?;
    Retriever::build(config.retrieval.clone(), corpus, embedder)
        .context("build retrieval indexes")
}
