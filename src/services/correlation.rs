//! Rule-based link inference between nodes.

use crate::context::{AppRuleStore, Context};
use crate::di::FromContext;
use crate::models::{clamp_score, CorrelationRule, Link, Node};

/// Links every node pair that shares a rule's keywords.
///
/// For each unordered pair the first active rule (store order) where both
/// nodes mention at least one rule keyword produces one link; later rules
/// are not considered for that pair. Root nodes take part like any other.
pub fn augment(nodes: &[Node], rules: &[CorrelationRule]) -> Vec<Link> {
    let active: Vec<(&CorrelationRule, Vec<String>)> = rules
        .iter()
        .filter(|r| r.is_active)
        .map(|r| (r, r.keywords.iter().map(|k| k.to_lowercase()).collect()))
        .collect();
    if active.is_empty() {
        return Vec::new();
    }

    let blobs: Vec<String> = nodes.iter().map(Node::text_blob).collect();
    let mut links = Vec::new();

    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let matched = active.iter().find(|(_, keywords)| {
                let mentions = |blob: &str| keywords.iter().any(|k| blob.contains(k.as_str()));
                mentions(&blobs[i]) && mentions(&blobs[j])
            });
            if let Some((rule, _)) = matched {
                links.push(Link {
                    source: nodes[i].id.clone(),
                    target: nodes[j].id.clone(),
                    label: Some(rule.label.clone()),
                    strength: Some(clamp_score(rule.strength as i64)),
                });
            }
        }
    }
    links
}

/// Applies stored correlation rules to a graph's nodes.
#[derive(FromContext, Clone)]
pub struct CorrelationEngine {
    rules: AppRuleStore,
}

impl CorrelationEngine {
    pub fn new(rules: AppRuleStore) -> Self {
        Self { rules }
    }

    /// Extra links for `nodes`. A failing rule store yields no links.
    pub async fn links_for(&self, nodes: &[Node]) -> Vec<Link> {
        let rules = match self.rules.active_rules().await {
            Ok(rules) => rules,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load correlation rules, skipping");
                return Vec::new();
            }
        };
        let links = augment(nodes, &rules);
        tracing::debug!(rules = rules.len(), links = links.len(), "Correlation pass complete");
        links
    }
}
