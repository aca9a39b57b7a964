//! Knowledge retrieval for prompt augmentation.

use crate::context::{AppKnowledgeStore, Context};
use crate::di::FromContext;
use crate::models::{KnowledgeItem, KnowledgeScope, MappingOptions};

/// Read-only lookup into the knowledge store.
#[derive(FromContext, Clone)]
pub struct KnowledgeRetriever {
    store: AppKnowledgeStore,
}

impl KnowledgeRetriever {
    pub fn new(store: AppKnowledgeStore) -> Self {
        Self { store }
    }

    /// Scope for a request: prefix on the main category hint when there is
    /// one, else the resolved category id.
    pub fn scope_for(options: &MappingOptions, category_id: &str) -> KnowledgeScope {
        match options.main_category() {
            Some(main) => KnowledgeScope::Prefix(main.to_string()),
            None => KnowledgeScope::Exact(category_id.to_string()),
        }
    }

    /// Active items for `scope`, newest first. Store failures yield nothing.
    pub async fn fetch(&self, scope: &KnowledgeScope, limit: usize) -> Vec<KnowledgeItem> {
        match self.store.find_active(scope, limit).await {
            Ok(items) => {
                tracing::debug!(scope = ?scope, count = items.len(), "Fetched knowledge items");
                items
            }
            Err(err) => {
                tracing::warn!(error = %err, scope = ?scope, "Knowledge lookup failed, continuing without context");
                Vec::new()
            }
        }
    }
}

/// Renders items as the prompt's knowledge block, one line per item.
pub fn format_context(items: &[KnowledgeItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- [{}]: {} (source: {})",
                item.title,
                item.content,
                item.source_url.as_deref().unwrap_or("internal knowledge")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
