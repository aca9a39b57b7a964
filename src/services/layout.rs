//! Deterministic geometric layouts.
//!
//! Every layout is a pure function of its input order: the same input always
//! yields the same ids and positions.

use std::f64::consts::PI;

use serde_json::{Map, Number, Value};

use crate::models::{
    AnalysisResult, Graph, GraphSummary, Link, Node, NodeType, Row,
};

/// Radius of the keyword sphere and the settlement circle.
const BASE_RADIUS: f64 = 15.0;
/// Minimum bar height in the settlement layout.
const MIN_HEIGHT: f64 = 2.0;

const AMOUNT_HEADERS: &[&str] = &[
    "amount", "price", "quantity", "qty", "total", "sum", "금액", "수량", "가격",
];
const LABEL_HEADERS: &[&str] = &[
    "명", "항목", "item", "name", "title", "label", "date", "날짜", "일자",
];
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".png", ".webp", ".jpeg"];

const ROOT_COLOR: &str = "#fbbf24";
const KEYWORD_COLOR: &str = "#00f2ff";
const TOTAL_COLOR: &str = "#10b981";
const ROW_COLOR: &str = "#38bdf8";
const DIAGRAM_ROOT_COLOR: &str = "#ffffff";

/// Builds renderable graphs from analysis results, rows, and objects.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    max_visual_rows: usize,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(50)
    }
}

impl LayoutEngine {
    pub fn new(max_visual_rows: usize) -> Self {
        Self { max_visual_rows }
    }

    /// Summary root with keywords on a golden-angle sphere.
    pub fn keyword_cloud(&self, analysis: &AnalysisResult) -> Graph {
        let summary = if analysis.summary.trim().is_empty() {
            "No summary available".to_string()
        } else {
            analysis.summary.clone()
        };

        let mut nodes = vec![root_node("root_summary", "AI SUMMARY", Value::String(summary), ROOT_COLOR)];
        let mut links = Vec::new();
        let count = analysis.keywords.len();

        for (i, keyword) in analysis.keywords.iter().enumerate() {
            let id = format!("kw_{i}");
            let value = if keyword.value.trim().is_empty() {
                keyword.term.clone()
            } else {
                keyword.value.clone()
            };
            nodes.push(Node {
                id: id.clone(),
                label: keyword.term.clone(),
                value: Value::String(value),
                pos: sphere_point(i, count, BASE_RADIUS),
                node_type: NodeType::Data,
                color: KEYWORD_COLOR.to_string(),
                importance: Some(keyword.importance),
                references: (!keyword.references.is_empty()).then(|| keyword.references.clone()),
            });
            links.push(Link::spoke("root_summary", &id));
        }

        for relation in &analysis.relations {
            let source = find_keyword_node(&nodes, &relation.source);
            let target = find_keyword_node(&nodes, &relation.target);
            if let (Some(source), Some(target)) = (source, target) {
                links.push(Link {
                    source,
                    target,
                    label: Some(relation.label.clone()),
                    strength: Some(relation.strength),
                });
            }
        }

        Graph::new("ai_analysis", nodes, links)
    }

    /// Total root with rows on a circle, bar height from the row amount.
    ///
    /// Only the first `max_visual_rows` rows are drawn; the total covers all.
    pub fn settlement(&self, rows: &[Row]) -> Graph {
        let values: Vec<Option<f64>> = rows.iter().map(row_amount).collect();
        let total: f64 = values.iter().flatten().sum();

        let mut nodes = vec![root_node("total", "TOTAL_SETTLEMENT", number_value(total), TOTAL_COLOR)];
        let mut links = Vec::new();

        let visible = rows.len().min(self.max_visual_rows);
        for (i, row) in rows.iter().take(visible).enumerate() {
            let id = format!("item_{i}");
            let angle = i as f64 / visible as f64 * 2.0 * PI;
            let height = match values[i] {
                Some(v) if v > 0.0 => (v / 1000.0).max(MIN_HEIGHT),
                _ => MIN_HEIGHT,
            };
            nodes.push(Node {
                id: id.clone(),
                label: row_label(row, i),
                value: Value::Object(row.clone()),
                pos: [angle.cos() * BASE_RADIUS, height, angle.sin() * BASE_RADIUS],
                node_type: NodeType::Data,
                color: ROW_COLOR.to_string(),
                importance: None,
                references: None,
            });
            links.push(Link::spoke("total", &id));
        }

        let mut graph = Graph::new("settlement", nodes, links);
        graph.summary = Some(GraphSummary::Totals {
            total_count: rows.len(),
            total_sum: total,
        });
        graph
    }

    /// One node per key around a data root.
    pub fn diagram(&self, object: &Map<String, Value>) -> Graph {
        let count = object.len();
        let radius = BASE_RADIUS.max((count as f64).sqrt() * 8.0);

        let mut nodes = vec![root_node("root", "Data Root", Value::Null, DIAGRAM_ROOT_COLOR)];
        let mut links = Vec::new();

        for (i, (key, value)) in object.iter().enumerate() {
            let id = format!("node_{i}");
            nodes.push(Node {
                id: id.clone(),
                label: key.clone(),
                value: value.clone(),
                pos: sphere_point(i, count, radius),
                node_type: if is_image_url(value) {
                    NodeType::Image
                } else {
                    NodeType::Data
                },
                color: KEYWORD_COLOR.to_string(),
                importance: None,
                references: None,
            });
            links.push(Link::spoke("root", &id));
        }

        Graph::new("diagram", nodes, links)
    }
}

/// Point `i` of `n` on a golden-angle (Fibonacci) sphere.
pub fn sphere_point(i: usize, n: usize, radius: f64) -> [f64; 3] {
    let phi = PI * (3.0 - 5f64.sqrt());
    let y = if n > 1 {
        1.0 - (i as f64 / (n - 1) as f64) * 2.0
    } else {
        0.0
    };
    let r = (1.0 - y * y).max(0.0).sqrt();
    let theta = phi * i as f64;
    [theta.cos() * r * radius, y * radius, theta.sin() * r * radius]
}

fn root_node(id: &str, label: &str, value: Value, color: &str) -> Node {
    Node {
        id: id.to_string(),
        label: label.to_string(),
        value,
        pos: [0.0, 0.0, 0.0],
        node_type: NodeType::Root,
        color: color.to_string(),
        importance: None,
        references: None,
    }
}

/// First keyword node whose non-empty label occurs in `text`.
fn find_keyword_node(nodes: &[Node], text: &str) -> Option<String> {
    nodes
        .iter()
        .filter(|n| n.node_type != NodeType::Root && !n.label.is_empty())
        .find(|n| text.contains(n.label.as_str()))
        .map(|n| n.id.clone())
}

/// Number from a JSON number or a numeric string (thousands separators allowed).
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn header_matches(header: &str, set: &[&str]) -> bool {
    let lowered = header.to_lowercase();
    set.iter().any(|k| lowered.contains(k))
}

/// Sum of amount-like columns, else the row's first numeric value.
fn row_amount(row: &Row) -> Option<f64> {
    let amounts: Vec<f64> = row
        .iter()
        .filter(|(k, _)| header_matches(k, AMOUNT_HEADERS))
        .filter_map(|(_, v)| numeric(v))
        .collect();
    if !amounts.is_empty() {
        return Some(amounts.iter().sum());
    }
    row.values().find_map(numeric)
}

fn row_label(row: &Row, index: usize) -> String {
    let labelled = row
        .iter()
        .filter(|(k, _)| header_matches(k, LABEL_HEADERS))
        .find_map(|(_, v)| scalar_text(v));
    labelled
        .or_else(|| row.values().find_map(scalar_text))
        .unwrap_or_else(|| format!("Item {index}"))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Integral totals render as integers.
fn number_value(total: f64) -> Value {
    if total.fract() == 0.0 && total.abs() < i64::MAX as f64 {
        Value::Number(Number::from(total as i64))
    } else {
        Number::from_f64(total).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn is_image_url(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            let lowered = s.to_lowercase();
            lowered.starts_with("http") && IMAGE_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::models::{Keyword, Relation};

    fn rows(value: Value) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn analysis(terms: &[&str]) -> AnalysisResult {
        AnalysisResult {
            summary: "summary".into(),
            keywords: terms.iter().map(|t| Keyword::new(*t)).collect(),
            ..Default::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_keyword_cloud_spokes_and_unique_ids() {
        let graph = LayoutEngine::default().keyword_cloud(&analysis(&["a", "b", "c", "d"]));
        let spokes = graph.links.iter().filter(|l| l.source == "root_summary").count();
        assert_eq!(spokes, 4);

        let ids: HashSet<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids.len(), graph.nodes.len());
        assert!(graph.dangling_links().is_empty());
        assert_eq!(graph.render_type, "ai_analysis");
    }

    #[test]
    fn test_keyword_cloud_positions() {
        let graph = LayoutEngine::default().keyword_cloud(&analysis(&["top", "bottom"]));
        let top = graph.node("kw_0").unwrap();
        let bottom = graph.node("kw_1").unwrap();
        assert!(approx(top.pos[1], 15.0));
        assert!(approx(bottom.pos[1], -15.0));

        let single = LayoutEngine::default().keyword_cloud(&analysis(&["only"]));
        let pos = single.node("kw_0").unwrap().pos;
        assert!(approx(pos[0], 15.0) && approx(pos[1], 0.0) && approx(pos[2], 0.0));
    }

    #[test]
    fn test_keyword_cloud_relations_match_labels() {
        let mut result = analysis(&["VAT", "Invoice"]);
        result.relations = vec![
            Relation {
                source: "VAT rate".into(),
                target: "Invoice total".into(),
                label: "applies to".into(),
                strength: 8,
            },
            Relation {
                source: "vat".into(),
                target: "Invoice".into(),
                label: "case mismatch".into(),
                strength: 3,
            },
        ];
        let graph = LayoutEngine::default().keyword_cloud(&result);
        let extra: Vec<_> = graph.links.iter().filter(|l| l.label.is_some()).collect();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].source, "kw_0");
        assert_eq!(extra[0].target, "kw_1");
        assert_eq!(extra[0].strength, Some(8));
    }

    #[test]
    fn test_settlement_totals_and_circle() {
        let data = rows(json!([
            {"item": "revenue", "amount": 12500},
            {"item": "cost", "amount": 7200}
        ]));
        let graph = LayoutEngine::default().settlement(&data);

        let total = graph.node("total").unwrap();
        assert_eq!(total.value, json!(19700));
        let first = graph.node("item_0").unwrap();
        let second = graph.node("item_1").unwrap();
        assert_eq!(first.label, "revenue");
        assert!(approx(first.pos[0], 15.0) && approx(first.pos[2], 0.0));
        assert!(approx(first.pos[1], 12.5));
        assert!(approx(second.pos[0], -15.0) && second.pos[2].abs() < 1e-9);
        assert!(approx(second.pos[1], 7.2));
        assert_eq!(
            graph.summary,
            Some(GraphSummary::Totals { total_count: 2, total_sum: 19700.0 })
        );
    }

    #[test]
    fn test_settlement_caps_visible_rows_but_not_total() {
        let data: Vec<Row> = (0..60)
            .map(|i| rows(json!([{"name": format!("r{i}"), "price": "1,000"}])).remove(0))
            .collect();
        let graph = LayoutEngine::default().settlement(&data);
        assert_eq!(graph.nodes.len(), 51);
        assert_eq!(graph.links.len(), 50);
        assert_eq!(graph.node("total").unwrap().value, json!(60000));
    }

    #[test]
    fn test_settlement_label_and_height_fallbacks() {
        let data = rows(json!([
            {"memo": "", "code": "A-1", "score": 3},
            {"memo": null, "flag": true},
            {}
        ]));
        let graph = LayoutEngine::default().settlement(&data);
        assert_eq!(graph.node("item_0").unwrap().label, "A-1");
        assert_eq!(graph.node("item_0").unwrap().pos[1], MIN_HEIGHT);
        assert_eq!(graph.node("item_1").unwrap().label, "true");
        assert_eq!(graph.node("item_2").unwrap().label, "Item 2");
        assert_eq!(graph.node("total").unwrap().value, json!(3));
    }

    #[test]
    fn test_settlement_fractional_total() {
        let data = rows(json!([{"amount": 1.5}, {"amount": "2.25"}]));
        let graph = LayoutEngine::default().settlement(&data);
        assert_eq!(graph.node("total").unwrap().value, json!(3.75));
    }

    #[test]
    fn test_diagram_images_and_radius() {
        let object = json!({
            "photo": "https://cdn.example.com/a.JPG",
            "page": "https://example.com/index.html",
            "count": 3
        });
        let graph = LayoutEngine::default().diagram(object.as_object().unwrap());
        assert_eq!(graph.render_type, "diagram");
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.node("node_0").unwrap().node_type, NodeType::Image);
        assert_eq!(graph.node("node_1").unwrap().node_type, NodeType::Data);
        assert!(approx(graph.node("node_0").unwrap().pos[1], 15.0));

        let wide: Map<String, Value> = (0..16).map(|i| (format!("k{i}"), json!(i))).collect();
        let graph = LayoutEngine::default().diagram(&wide);
        assert!(approx(graph.node("node_0").unwrap().pos[1], 32.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let result = analysis(&["x", "y", "z"]);
        let engine = LayoutEngine::default();
        assert_eq!(engine.keyword_cloud(&result), engine.keyword_cloud(&result));
    }
}
