//! Keyword-based category detection.

use std::sync::Arc;

use crate::context::Context;
use crate::di::FromContext;
use crate::models::{Category, CategoryRegistry, MappingOptions, ModelTier, DEFAULT_CATEGORY_ID};

/// Category chosen for one text input.
///
/// `id` may name a category outside the registry when the caller supplied
/// explicit hints; `tier` and `description` then come from the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCategory {
    pub id: String,
    pub tier: ModelTier,
    pub description: String,
}

/// Scores text against the category registry.
#[derive(FromContext, Clone)]
pub struct CategoryDetector {
    registry: Arc<CategoryRegistry>,
}

impl CategoryDetector {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self { registry }
    }

    /// Category id with the most distinct keyword hits.
    ///
    /// Matching is case-insensitive substring search. Ties go to the earlier
    /// registry entry; no hits at all yields the default category.
    pub fn detect(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let mut best: Option<(&Category, usize)> = None;

        for category in self.registry.iter() {
            let score = category
                .keywords
                .iter()
                .filter(|k| lowered.contains(&k.to_lowercase()))
                .count();
            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((category, score));
            }
        }

        best.map(|(c, _)| c.id.clone())
            .unwrap_or_else(|| DEFAULT_CATEGORY_ID.to_string())
    }

    /// Explicit `"{main}_{sub}"` when both hints are given, else [`detect`].
    ///
    /// [`detect`]: CategoryDetector::detect
    pub fn resolve(&self, text: &str, options: &MappingOptions) -> ResolvedCategory {
        let id = match options.explicit_category() {
            Some(id) => id,
            None => self.detect(text),
        };
        let category = self.registry.resolve(&id);
        if category.id != id {
            tracing::debug!(category = %id, "Category not registered, using default tier");
        }
        ResolvedCategory {
            tier: category.tier,
            description: category.description.clone(),
            id,
        }
    }
}
