//! Application context providing dependency injection root.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::di::Context as ContextDerive;
use crate::error::AppError;
use crate::models::CategoryRegistry;
use crate::repositories::{
    InMemoryStore, KnowledgeStore, MappingStore, PostgresStore, RuleStore,
};
use crate::services::llm::RateWindow;

/// Shared knowledge store handle.
pub type AppKnowledgeStore = Arc<dyn KnowledgeStore>;
/// Shared correlation rule store handle.
pub type AppRuleStore = Arc<dyn RuleStore>;
/// Shared result store handle.
pub type AppMappingStore = Arc<dyn MappingStore>;

/// Root application context for dependency injection.
///
/// Holds every process-wide dependency; `#[derive(Context)]` generates a
/// `FromRef` impl per field so services can be resolved with
/// `Service::from_ref(&ctx)`. The rate window lives here so every request in
/// the process shares it.
#[derive(ContextDerive, Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub categories: Arc<CategoryRegistry>,
    pub rate_window: Arc<RateWindow>,
    pub http: reqwest::Client,
    pub knowledge_store: AppKnowledgeStore,
    pub rule_store: AppRuleStore,
    pub mapping_store: AppMappingStore,
}

impl Context {
    /// Builds the context from configuration.
    ///
    /// Uses Postgres stores when URIs are configured and in-memory stores
    /// (seeded with the default rules) otherwise.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let (rule_store, mapping_store): (AppRuleStore, AppMappingStore) =
            match config.postgres.uri.as_deref() {
                Some(uri) => {
                    tracing::info!("Using PostgreSQL rule/result store");
                    let store = Arc::new(PostgresStore::connect(uri).await?);
                    (store.clone() as AppRuleStore, store as AppMappingStore)
                }
                None => {
                    tracing::info!("No postgres.uri configured, using in-memory store");
                    let store = Arc::new(InMemoryStore::with_default_rules());
                    (store.clone() as AppRuleStore, store as AppMappingStore)
                }
            };

        let knowledge_store: AppKnowledgeStore =
            match config.knowledge.effective_uri(&config.postgres) {
                Some(uri) => Arc::new(PostgresStore::connect(uri).await?),
                None => Arc::new(InMemoryStore::new()),
            };

        Self::with_stores(config, knowledge_store, rule_store, mapping_store)
    }

    /// Builds the context around explicit stores.
    pub fn with_stores(
        config: Config,
        knowledge_store: AppKnowledgeStore,
        rule_store: AppRuleStore,
        mapping_store: AppMappingStore,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.local.health_timeout_secs.max(1)))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            categories: Arc::new(CategoryRegistry::from_config(&config.categories)),
            rate_window: Arc::new(RateWindow::new(
                config.cloud.requests_per_window,
                config.cloud.window_secs,
            )),
            http,
            knowledge_store,
            rule_store,
            mapping_store,
            config: Arc::new(config),
        })
    }

    /// Context backed by one shared in-memory store.
    pub fn in_memory(config: Config, store: Arc<InMemoryStore>) -> Result<Self, AppError> {
        Self::with_stores(config, store.clone(), store.clone(), store)
    }
}
