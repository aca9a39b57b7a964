//! In-process store used when no database is configured, and in tests.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::AppError;
use crate::models::{CorrelationRule, KnowledgeItem, KnowledgeScope, MappingRecord};
use crate::repositories::traits::{KnowledgeStore, MappingStore, RuleStore};

/// Knowledge item with the `is_active` column the database keeps beside it.
struct KnowledgeEntry {
    item: KnowledgeItem,
    is_active: bool,
}

/// Store keeping knowledge, rules, and saved mappings in memory.
#[derive(Default)]
pub struct InMemoryStore {
    knowledge: RwLock<Vec<KnowledgeEntry>>,
    rules: RwLock<Vec<CorrelationRule>>,
    mappings: RwLock<Vec<MappingRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the built-in correlation rules.
    pub fn with_default_rules() -> Self {
        let store = Self::new();
        *store.rules.write() = CorrelationRule::defaults();
        store
    }

    pub fn with_rules(rules: Vec<CorrelationRule>) -> Self {
        let store = Self::new();
        *store.rules.write() = rules;
        store
    }

    pub fn add_knowledge(&self, item: KnowledgeItem) {
        self.add_knowledge_with_status(item, true);
    }

    /// Adds an item; inactive items are never returned by lookups.
    pub fn add_knowledge_with_status(&self, item: KnowledgeItem, is_active: bool) {
        self.knowledge.write().push(KnowledgeEntry { item, is_active });
    }

    /// Saved mappings in insertion order.
    pub fn mappings(&self) -> Vec<MappingRecord> {
        self.mappings.read().clone()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn find_active(
        &self,
        scope: &KnowledgeScope,
        limit: usize,
    ) -> Result<Vec<KnowledgeItem>, AppError> {
        let mut items: Vec<KnowledgeItem> = self
            .knowledge
            .read()
            .iter()
            .filter(|entry| entry.is_active && scope.matches(&entry.item.category))
            .map(|entry| entry.item.clone())
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait]
impl RuleStore for InMemoryStore {
    async fn active_rules(&self) -> Result<Vec<CorrelationRule>, AppError> {
        Ok(self
            .rules
            .read()
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MappingStore for InMemoryStore {
    async fn save(&self, record: &MappingRecord) -> Result<String, AppError> {
        self.mappings.write().push(record.clone());
        Ok(record.id.clone())
    }
}
