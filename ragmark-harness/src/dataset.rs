use anyhow::Context;
use log::info;
use ragmark_retrieval::Article;
use std::fs;
use std::path::Path;

/// Load the knowledge base: a JSON array of help-center articles.
pub fn load_knowledge_base(path: &Path) -> anyhow::Result<Vec<Article>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read knowledge base {}", path.display()))?;
    let articles: Vec<Article> = serde_json::from_str(&raw)
        .with_context(|| format!("parse knowledge base {}", path.display()))?;

    info!("Loaded {} knowledge base articles", articles.len());
    Ok(articles)
}

/// Load the prompt set: a JSON array of question strings.
pub fn load_prompts(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read prompts {}", path.display()))?;
    let prompts: Vec<String> =
        serde_json::from_str(&raw).with_context(|| format!("parse prompts {}", path.display()))?;

    info!("Loaded {} prompts", prompts.len());
    Ok(prompts)
}
