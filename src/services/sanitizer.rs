//! Reference URL sanitization.
//!
//! Model output is untrusted, so every reference URL is checked before a
//! graph leaves the pipeline. Rejected URLs are removed silently.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::models::{Graph, Reference};

pub const MAX_URL_LENGTH: usize = 2048;

static SCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript\s*:").expect("Invalid regex"));

static DATA_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)data\s*:").expect("Invalid regex"));

/// Whether `url` is a safe external http(s) link.
pub fn is_safe_url(url: &Value) -> bool {
    let Value::String(raw) = url else {
        return false;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_URL_LENGTH {
        return false;
    }
    if SCRIPT_SCHEME.is_match(trimmed) || DATA_SCHEME.is_match(trimmed) {
        return false;
    }
    match Url::parse(trimmed) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Drops unsafe URLs, then references left with no fields.
pub fn sanitize_references(references: Vec<Reference>) -> Vec<Reference> {
    references
        .into_iter()
        .map(|mut reference| {
            if reference.url.as_ref().is_some_and(|u| !is_safe_url(u)) {
                tracing::debug!(url = ?reference.url, "Dropping unsafe reference URL");
                reference.url = None;
            }
            reference
        })
        .filter(|r| !r.is_empty())
        .collect()
}

/// Sanitizes every node's references in place.
pub fn sanitize_graph(graph: &mut Graph) {
    for node in &mut graph.nodes {
        if let Some(references) = node.references.take() {
            let cleaned = sanitize_references(references);
            node.references = (!cleaned.is_empty()).then_some(cleaned);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Node, NodeType};

    fn reference(url: Value) -> Reference {
        Reference {
            title: None,
            url: Some(url),
            snippet: None,
        }
    }

    #[test]
    fn test_safe_and_unsafe_urls() {
        assert!(is_safe_url(&json!("https://example.com/doc")));
        assert!(is_safe_url(&json!("  http://example.com  ")));
        assert!(!is_safe_url(&json!("javascript:alert(1)")));
        assert!(!is_safe_url(&json!("JavaScript :alert(1)")));
        assert!(!is_safe_url(&json!("data:text/html;base64,AAAA")));
        assert!(!is_safe_url(&json!("ftp://example.com/file")));
        assert!(!is_safe_url(&json!("https://")));
        assert!(!is_safe_url(&json!("/relative/path")));
        assert!(!is_safe_url(&json!("   ")));
        assert!(!is_safe_url(&json!(42)));
        assert!(!is_safe_url(&Value::Null));
    }

    #[test]
    fn test_overlong_url_rejected() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(!is_safe_url(&json!(url)));
    }

    #[test]
    fn test_url_at_length_limit_kept() {
        let base = "https://example.com/";
        let url = format!("{}{}", base, "a".repeat(MAX_URL_LENGTH - base.len()));
        assert_eq!(url.chars().count(), MAX_URL_LENGTH);
        assert!(is_safe_url(&json!(url)));
        assert!(!is_safe_url(&json!(format!("{}a", url))));
    }

    #[test]
    fn test_embedded_data_marker_rejected() {
        // Matched anywhere in the string, not only as the scheme.
        assert!(!is_safe_url(&json!("https://example.com/?next=data:x")));
    }

    #[test]
    fn test_sanitize_references_drops_empty_entries() {
        let refs = vec![
            reference(json!("javascript:alert(1)")),
            Reference {
                title: Some("Docs".into()),
                url: Some(json!("javascript:alert(1)")),
                snippet: None,
            },
            reference(json!("https://example.com/doc")),
        ];
        let cleaned = sanitize_references(refs);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].title.as_deref(), Some("Docs"));
        assert!(cleaned[0].url.is_none());
        assert_eq!(cleaned[1].url, Some(json!("https://example.com/doc")));
    }

    #[test]
    fn test_sanitize_graph() {
        let mut graph = Graph::new(
            "ai_analysis",
            vec![Node {
                id: "kw_0".into(),
                label: "x".into(),
                value: Value::Null,
                pos: [0.0; 3],
                node_type: NodeType::Data,
                color: "#00f2ff".into(),
                importance: Some(5),
                references: Some(vec![reference(json!("javascript:alert(1)"))]),
            }],
            vec![],
        );
        sanitize_graph(&mut graph);
        assert!(graph.nodes[0].references.is_none());
    }
}
