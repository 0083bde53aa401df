use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single help-center knowledge-base article.
///
/// Articles are loaded once at startup and never mutated; retrieval refers
/// to them by their position in the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique article identifier, e.g. "KA-000042"
    #[serde(rename = "ArticleNumber")]
    pub article_number: String,

    /// Short headline
    #[serde(rename = "Title")]
    pub title: String,

    /// Full answer body
    #[serde(rename = "Answer")]
    pub answer: String,

    /// Any extra metadata fields carried along unchanged
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Article {
    /// Create a new article without extra metadata
    pub fn new(
        article_number: impl Into<String>,
        title: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            article_number: article_number.into(),
            title: title.into(),
            answer: answer.into(),
            extra: HashMap::new(),
        }
    }

    /// Text used for indexing: title and answer joined by a newline
    pub fn document_text(&self) -> String {
        format!("{}\n{}", self.title, self.answer)
    }
}
