//! End-to-end mapping pipeline.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::config::Config;
use crate::context::{AppMappingStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{
    generate_ulid, AnalysisResult, Graph, GraphSummary, MappingOptions, MappingRecord, RawInput,
    RenderType, RouteTag,
};
use crate::services::category::CategoryDetector;
use crate::services::classifier::classify;
use crate::services::correlation::CorrelationEngine;
use crate::services::knowledge::{format_context, KnowledgeRetriever};
use crate::services::layout::LayoutEngine;
use crate::services::llm::{ModelRequest, ModelRouter, PromptBuilder};
use crate::services::sanitizer::sanitize_graph;
use crate::services::table_parser;

/// Turns raw input into a positioned, correlated, sanitized graph.
#[derive(FromContext, Clone)]
pub struct MappingService {
    config: Arc<Config>,
    detector: CategoryDetector,
    knowledge: KnowledgeRetriever,
    router: ModelRouter,
    correlation: CorrelationEngine,
    mappings: AppMappingStore,
}

impl MappingService {
    /// Runs the pipeline. Never fails; every stage degrades in place.
    pub async fn process_to_graph(
        &self,
        route_hint: &str,
        raw: &RawInput,
        options: &MappingOptions,
    ) -> Graph {
        let started = Instant::now();
        let layout = LayoutEngine::new(self.config.pipeline.max_visual_rows);
        let route = classify(route_hint, raw);
        tracing::debug!(route = ?route, route_hint, "Classified input");

        let mut graph = match (route, raw) {
            (RouteTag::Tabular, RawInput::Rows(rows)) => layout.settlement(rows),
            (RouteTag::Structured, RawInput::Object(object)) => layout.diagram(object),
            _ => self.process_text(&raw.to_text(), options, &layout).await,
        };

        let extra = self.correlation.links_for(&graph.nodes).await;
        graph.links.extend(extra);
        sanitize_graph(&mut graph);

        graph.processing_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            render_type = %graph.render_type,
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            elapsed_ms = graph.processing_time_ms,
            "Mapping complete"
        );
        graph
    }

    /// Runs the pipeline and persists the result.
    ///
    /// Only the store write can fail.
    pub async fn process_and_store(
        &self,
        route_hint: &str,
        raw: &RawInput,
        options: &MappingOptions,
    ) -> Result<MappingRecord, AppError> {
        let graph = self.process_to_graph(route_hint, raw, options).await;
        let record = MappingRecord {
            id: generate_ulid(),
            data_type: route_hint.to_string(),
            category: graph.detected_category.clone(),
            model_used: graph.model_used.clone(),
            processing_time_ms: graph.processing_time_ms,
            mapping: graph,
            created_at: Utc::now(),
        };

        self.mappings.save(&record).await?;
        tracing::info!(id = %record.id, "Mapping stored");
        Ok(record)
    }

    async fn process_text(
        &self,
        text: &str,
        options: &MappingOptions,
        layout: &LayoutEngine,
    ) -> Graph {
        if options.render_type != RenderType::Diagram {
            if let Some(rows) = table_parser::try_parse(text) {
                tracing::debug!(rows = rows.len(), "Text parsed as table");
                return layout.settlement(&rows);
            }
        }

        let analysis = self.analyze_text(text, options).await;
        let mut graph = if !analysis.table_data.is_empty() && options.render_type != RenderType::Diagram {
            layout.settlement(&analysis.table_data)
        } else {
            let mut graph = layout.keyword_cloud(&analysis);
            graph.summary = Some(GraphSummary::Text(analysis.summary.clone()));
            graph
        };

        graph.detected_category = Some(analysis.detected_category);
        graph.model_tier = Some(analysis.model_tier);
        graph.model_used = Some(analysis.model_used);
        graph.rag_applied = Some(analysis.rag_applied);
        graph
    }

    /// Category, knowledge, prompt and model routing for one text.
    pub async fn analyze_text(&self, text: &str, options: &MappingOptions) -> AnalysisResult {
        let category = self.detector.resolve(text, options);
        let scope = KnowledgeRetriever::scope_for(options, &category.id);
        let items = self
            .knowledge
            .fetch(&scope, self.config.pipeline.knowledge_limit)
            .await;

        let prompt = PromptBuilder::new(self.config.pipeline.prompt_char_limit).build(
            text,
            &category,
            &format_context(&items),
            options.render_type,
        );
        let request = ModelRequest {
            prompt: &prompt,
            text,
            category: &category,
        };

        AnalysisResult {
            detected_category: category.id.clone(),
            rag_applied: !items.is_empty(),
            ..self.router.analyze(&request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::di::FromRef;
    use crate::models::{KnowledgeItem, NodeType};
    use crate::repositories::{InMemoryStore, MappingStore};

    fn offline_config() -> Config {
        let mut config = Config::default();
        config.local.enabled = false;
        config
    }

    fn service(store: Arc<InMemoryStore>) -> MappingService {
        let ctx = Context::in_memory(offline_config(), store).unwrap();
        MappingService::from_ref(&ctx)
    }

    #[tokio::test]
    async fn test_rows_render_as_settlement() {
        let svc = service(Arc::new(InMemoryStore::new()));
        let raw = RawInput::from(json!([{"item": "a", "amount": 5}]));
        let graph = svc.process_to_graph("", &raw, &MappingOptions::default()).await;
        assert_eq!(graph.render_type, "settlement");
        assert!(graph.model_used.is_none());
    }

    #[tokio::test]
    async fn test_object_renders_as_diagram() {
        let svc = service(Arc::new(InMemoryStore::new()));
        let raw = RawInput::from(json!({"a": 1, "b": "https://x.io/p.png"}));
        let graph = svc.process_to_graph("json", &raw, &MappingOptions::default()).await;
        assert_eq!(graph.render_type, "diagram");
        assert_eq!(graph.node("node_1").unwrap().node_type, NodeType::Image);
    }

    #[tokio::test]
    async fn test_table_text_skips_analysis() {
        let svc = service(Arc::new(InMemoryStore::new()));
        let raw = RawInput::from("item\tamount\nrevenue\t12500\ncost\t7200");
        let graph = svc
            .process_to_graph("document_analysis", &raw, &MappingOptions::default())
            .await;
        assert_eq!(graph.render_type, "settlement");
        assert_eq!(graph.node("total").unwrap().value, json!(19700));
    }

    #[tokio::test]
    async fn test_diagram_hint_forces_analysis_for_table_text() {
        let svc = service(Arc::new(InMemoryStore::new()));
        let raw = RawInput::from("item,amount\nserver,3\ndatabase,4");
        let options = MappingOptions {
            render_type: RenderType::Diagram,
            ..Default::default()
        };
        let graph = svc.process_to_graph("text", &raw, &options).await;
        assert_eq!(graph.render_type, "ai_analysis");
        assert_eq!(graph.model_used.as_deref(), Some("embedded-extractive"));
    }

    #[tokio::test]
    async fn test_text_analysis_metadata_and_rag() {
        let store = Arc::new(InMemoryStore::with_default_rules());
        store.add_knowledge(KnowledgeItem {
            title: "K8s".into(),
            content: "cluster sizing".into(),
            category: "INFRA_ARCHITECTURE".into(),
            source_url: None,
            updated_at: Utc::now(),
        });
        let svc = service(store);
        let raw = RawInput::from("The kubernetes cluster runs docker images on aws. The cluster scales.");
        let graph = svc.process_to_graph("text", &raw, &MappingOptions::default()).await;

        assert_eq!(graph.render_type, "ai_analysis");
        assert_eq!(graph.detected_category.as_deref(), Some("INFRA_ARCHITECTURE"));
        assert_eq!(graph.model_tier.as_deref(), Some("pro"));
        assert_eq!(graph.rag_applied, Some(true));
        assert!(graph.node("root_summary").is_some());
        assert!(graph.dangling_links().is_empty());
    }

    #[tokio::test]
    async fn test_process_and_store_persists_record() {
        let store = Arc::new(InMemoryStore::with_default_rules());
        let svc = service(store.clone());
        let raw = RawInput::from(json!([{"item": "revenue", "amount": 1}]));
        let record = svc
            .process_and_store("excel", &raw, &MappingOptions::default())
            .await
            .unwrap();

        let saved = store.mappings();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, record.id);
        assert_eq!(record.data_type, "excel");
        assert_eq!(record.id.len(), 26);
    }

    struct FailingMappingStore;

    #[async_trait]
    impl MappingStore for FailingMappingStore {
        async fn save(&self, _record: &MappingRecord) -> Result<String, AppError> {
            Err(AppError::Persist("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = Context::with_stores(
            offline_config(),
            store.clone(),
            store,
            Arc::new(FailingMappingStore),
        )
        .unwrap();
        let svc = MappingService::from_ref(&ctx);
        let err = svc
            .process_and_store("text", &RawInput::from("hello world"), &MappingOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persist(_)));
    }
}
