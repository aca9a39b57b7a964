//! PostgreSQL store implementation.
//!
//! One [`PostgresStore`] wraps a deadpool connection pool. The rule/result
//! database and the read-only knowledge database are usually separate, so
//! the context opens one store per URI.
//!
//! Expected tables:
//!
//! | Table | Columns used |
//! |-------|--------------|
//! | `knowledge_base` | title, content, category, source_url, is_active, updated_at |
//! | `correlation_rules` | id, category, keywords (json), strength, label, is_active |
//! | `mapping_data` | id, data_type, category, model_used, mapping_data (jsonb), processing_time_ms, created_at |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use serde_json::Value as JsonValue;
use tokio_postgres::NoTls;

use crate::error::AppError;
use crate::models::{
    clamp_score, CorrelationRule, KnowledgeItem, KnowledgeScope, MappingRecord,
};
use crate::repositories::traits::{KnowledgeStore, MappingStore, RuleStore};

const KNOWLEDGE_PREFIX_SQL: &str = "SELECT title, content, category, source_url, updated_at
     FROM knowledge_base
     WHERE category LIKE $1 ESCAPE '\\' AND is_active = true
     ORDER BY updated_at DESC
     LIMIT $2";

const KNOWLEDGE_EXACT_SQL: &str = "SELECT title, content, category, source_url, updated_at
     FROM knowledge_base
     WHERE category = $1 AND is_active = true
     ORDER BY updated_at DESC
     LIMIT $2";

const ACTIVE_RULES_SQL: &str = "SELECT category, keywords, strength, label, is_active
     FROM correlation_rules
     WHERE is_active IS NOT FALSE
     ORDER BY id";

const INSERT_MAPPING_SQL: &str = "INSERT INTO mapping_data
     (id, data_type, category, model_used, mapping_data, processing_time_ms, created_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

/// PostgreSQL-backed store.
///
/// Cheap to clone; the pool is `Arc`-based.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Creates a pooled store.
    ///
    /// The pool connects lazily, so an unreachable database surfaces on the
    /// first query rather than here.
    pub async fn connect(connection_string: &str) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config = connection_string.parse().map_err(|e| {
            AppError::Internal(format!("Invalid PostgreSQL connection string: {}", e))
        })?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(16)
            .build()
            .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    async fn get_connection(&self) -> Result<Object, AppError> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::Pool(format!("Failed to get connection from pool: {}", e)))
    }

    /// Runs one or more SQL statements without results.
    pub async fn execute_sql(&self, sql: &str) -> Result<(), AppError> {
        let conn = self.get_connection().await?;
        conn.batch_execute(sql)
            .await
            .map_err(|e| AppError::query(e, sql))
    }
}

#[async_trait]
impl KnowledgeStore for PostgresStore {
    async fn find_active(
        &self,
        scope: &KnowledgeScope,
        limit: usize,
    ) -> Result<Vec<KnowledgeItem>, AppError> {
        let conn = self.get_connection().await?;
        let limit = limit as i64;

        let (sql, needle) = match scope {
            KnowledgeScope::Prefix(prefix) => {
                (KNOWLEDGE_PREFIX_SQL, format!("{}%", escape_like(prefix)))
            }
            KnowledgeScope::Exact(id) => (KNOWLEDGE_EXACT_SQL, id.clone()),
        };

        let rows = conn
            .query(sql, &[&needle, &limit])
            .await
            .map_err(|e| AppError::query(e, sql))?;

        rows.iter()
            .map(|row| {
                Ok(KnowledgeItem {
                    title: row.try_get("title")?,
                    content: row.try_get("content")?,
                    category: row.try_get("category")?,
                    source_url: row.try_get("source_url")?,
                    updated_at: row.try_get::<_, DateTime<Utc>>("updated_at")?,
                })
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()
            .map_err(AppError::from)
    }
}

#[async_trait]
impl RuleStore for PostgresStore {
    async fn active_rules(&self) -> Result<Vec<CorrelationRule>, AppError> {
        let conn = self.get_connection().await?;
        let rows = conn
            .query(ACTIVE_RULES_SQL, &[])
            .await
            .map_err(|e| AppError::query(e, ACTIVE_RULES_SQL))?;

        let mut rules = Vec::with_capacity(rows.len());
        for row in &rows {
            rules.push(rule_from_columns(
                row.try_get("category")?,
                row.try_get("keywords")?,
                row.try_get("strength")?,
                row.try_get("label")?,
                row.try_get("is_active")?,
            ));
        }
        Ok(rules)
    }
}

#[async_trait]
impl MappingStore for PostgresStore {
    async fn save(&self, record: &MappingRecord) -> Result<String, AppError> {
        let conn = self.get_connection().await?;
        let mapping = serde_json::to_value(&record.mapping)?;
        let processing_time_ms = record.processing_time_ms as i64;

        conn.execute(
            INSERT_MAPPING_SQL,
            &[
                &record.id,
                &record.data_type,
                &record.category,
                &record.model_used,
                &mapping,
                &processing_time_ms,
                &record.created_at,
            ],
        )
        .await
        .map_err(|e| AppError::Persist(e.to_string()))?;

        Ok(record.id.clone())
    }
}

/// Escapes `LIKE` wildcards so a category prefix matches literally.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Builds a rule from nullable columns, keeping only string keywords.
fn rule_from_columns(
    category: String,
    keywords: JsonValue,
    strength: Option<i32>,
    label: Option<String>,
    is_active: Option<bool>,
) -> CorrelationRule {
    let keywords = match keywords {
        JsonValue::Array(items) => items
            .into_iter()
            .filter_map(|k| match k {
                JsonValue::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    CorrelationRule {
        label: label.unwrap_or_else(|| category.clone()),
        category,
        keywords,
        strength: clamp_score(strength.unwrap_or(5) as i64),
        is_active: is_active.unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("FINANCE"), "FINANCE");
        assert_eq!(escape_like("FIN_TAX"), "FIN\\_TAX");
        assert_eq!(escape_like("100%"), "100\\%");
    }

    #[test]
    fn test_rule_from_columns_defaults() {
        let rule = rule_from_columns(
            "FINANCE".to_string(),
            json!(["payment", 3, "", "정산"]),
            None,
            None,
            None,
        );
        assert_eq!(rule.keywords, vec!["payment", "정산"]);
        assert_eq!(rule.strength, 5);
        assert_eq!(rule.label, "FINANCE");
        assert!(rule.is_active);
    }

    #[test]
    fn test_rule_from_columns_clamps_strength() {
        let rule = rule_from_columns(
            "INFRA".to_string(),
            json!("not a list"),
            Some(42),
            Some("Infra".to_string()),
            Some(false),
        );
        assert!(rule.keywords.is_empty());
        assert_eq!(rule.strength, 10);
        assert!(!rule.is_active);
    }
}
