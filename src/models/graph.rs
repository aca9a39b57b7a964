//! Renderable node/link graph produced by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Reference;

/// Node role in the rendered scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Central node (summary or total).
    Root,
    /// Regular data node.
    Data,
    /// Node whose value is an image URL.
    Image,
}

/// A positioned node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within one graph.
    pub id: String,
    pub label: String,
    /// Scalar, text, or the full row payload for settlement nodes.
    pub value: Value,
    pub pos: [f64; 3],
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

impl Node {
    /// Lowercased label and value text, used for keyword matching.
    pub fn text_blob(&self) -> String {
        let value = match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        format!("{} {}", self.label, value).to_lowercase()
    }
}

/// A link between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u8>,
}

impl Link {
    /// Unlabelled spoke from a root node.
    pub fn spoke(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            label: None,
            strength: None,
        }
    }
}

/// Summary attached to a graph: model prose or settlement totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphSummary {
    Text(String),
    Totals { total_count: usize, total_sum: f64 },
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// `settlement`, `ai_analysis` or `diagram`.
    pub render_type: String,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<GraphSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_applied: Option<bool>,
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl Graph {
    pub fn new(render_type: &str, nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self {
            render_type: render_type.to_string(),
            nodes,
            links,
            summary: None,
            detected_category: None,
            model_tier: None,
            model_used: None,
            rag_applied: None,
            processing_time_ms: 0,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Links whose endpoints do not name a node of this graph.
    pub fn dangling_links(&self) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| self.node(&l.source).is_none() || self.node(&l.target).is_none())
            .collect()
    }
}

/// A persisted pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// ULID.
    pub id: String,
    /// Route hint or file description the request came in with.
    pub data_type: String,
    pub category: Option<String>,
    pub model_used: Option<String>,
    pub mapping: Graph,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}
