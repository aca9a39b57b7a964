//! End-to-end pipeline tests against in-memory stores.

use std::f64::consts::PI;
use std::sync::Arc;

use quantumviz::config::Config;
use quantumviz::context::Context;
use quantumviz::models::{GraphSummary, MappingOptions, RawInput, RenderType};
use quantumviz::repositories::InMemoryStore;
use quantumviz::services::MappingService;
use quantumviz::FromRef;
use serde_json::json;

fn offline_service(store: Arc<InMemoryStore>) -> MappingService {
    let mut config = Config::default();
    config.local.enabled = false;
    let ctx = Context::in_memory(config, store).expect("context");
    MappingService::from_ref(&ctx)
}

#[tokio::test]
async fn test_settlement_rows_end_to_end() {
    let service = offline_service(Arc::new(InMemoryStore::with_default_rules()));
    let raw = RawInput::from(json!([
        {"item": "revenue", "amount": 12500},
        {"item": "cost", "amount": 7200}
    ]));
    let options = MappingOptions {
        render_type: RenderType::Settlement,
        ..Default::default()
    };

    let graph = service.process_to_graph("excel", &raw, &options).await;

    assert_eq!(graph.render_type, "settlement");
    assert_eq!(graph.node("total").unwrap().value, json!(19700));
    assert_eq!(
        graph.summary,
        Some(GraphSummary::Totals {
            total_count: 2,
            total_sum: 19700.0
        })
    );

    for (id, angle) in [("item_0", 0.0), ("item_1", PI)] {
        let pos = graph.node(id).unwrap().pos;
        assert!((pos[0] - 15.0 * f64::cos(angle)).abs() < 1e-9, "{id} x");
        assert!((pos[2] - 15.0 * f64::sin(angle)).abs() < 1e-9, "{id} z");
        assert!((pos[0].hypot(pos[2]) - 15.0).abs() < 1e-9);
    }

    // "amount" is a FINANCE keyword, so correlation links every node pair.
    let correlated: Vec<_> = graph
        .links
        .iter()
        .filter(|l| l.label.as_deref() == Some("Financial Connection"))
        .collect();
    assert!(!correlated.is_empty());
    assert!(graph.dangling_links().is_empty());
}

#[tokio::test]
async fn test_stored_record_serializes_graph() {
    let store = Arc::new(InMemoryStore::new());
    let service = offline_service(store.clone());
    let raw = RawInput::from(json!({"name": "gateway", "logo": "https://cdn.example.com/logo.png"}));

    let record = service
        .process_and_store("json", &raw, &MappingOptions::default())
        .await
        .unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["mapping"]["render_type"], "diagram");
    assert_eq!(json["mapping"]["nodes"][2]["type"], "image");
    assert_eq!(store.mappings().len(), 1);
}
