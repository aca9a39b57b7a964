//! Knowledge base entries used for retrieval-augmented prompts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry of the external, read-only knowledge store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub title: String,
    pub content: String,
    pub category: String,
    pub source_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// How knowledge items are matched against a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeScope {
    /// Every category starting with the main category.
    Prefix(String),
    /// Exactly the resolved category id.
    Exact(String),
}

impl KnowledgeScope {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            KnowledgeScope::Prefix(prefix) => category.starts_with(prefix.as_str()),
            KnowledgeScope::Exact(id) => category == id,
        }
    }
}
