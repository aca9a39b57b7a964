//! Store traits for the pipeline's external collaborators.
//!
//! - [`KnowledgeStore`] - read-only knowledge base (retrieval context)
//! - [`RuleStore`] - correlation rules, read-only to the pipeline
//! - [`MappingStore`] - persisted pipeline results

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{CorrelationRule, KnowledgeItem, KnowledgeScope, MappingRecord};

/// Read-only access to the knowledge base.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Active items matching `scope`, most recently updated first, at most
    /// `limit` of them.
    async fn find_active(
        &self,
        scope: &KnowledgeScope,
        limit: usize,
    ) -> Result<Vec<KnowledgeItem>, AppError>;
}

/// Read access to correlation rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active rules in store order.
    async fn active_rules(&self) -> Result<Vec<CorrelationRule>, AppError>;
}

/// Persistence for pipeline results.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Writes `record` and returns its id.
    async fn save(&self, record: &MappingRecord) -> Result<String, AppError>;
}
