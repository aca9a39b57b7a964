//! In-process extractive fallback.
//!
//! Term frequency over the input text, with co-occurrence inside sentences
//! standing in for relations. Crude, but it needs no network and always
//! produces a renderable result.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{clamp_score, AnalysisResult, Keyword, ModelTier, Relation};

use super::{ModelBackend, ModelRequest};

const SUMMARY_MAX_CHARS: usize = 200;
const DEFINITION_MAX_CHARS: usize = 120;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "for", "from", "had",
    "has", "have", "he", "her", "his", "if", "in", "into", "is", "it", "its", "not", "of", "on",
    "or", "our", "she", "so", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "to", "was", "we", "were", "what", "when", "which", "who", "will", "with",
    "would", "you", "your",
];

/// Extractive keyword model.
pub struct EmbeddedBackend {
    max_keywords: usize,
}

impl EmbeddedBackend {
    pub fn new(max_keywords: usize) -> Self {
        Self {
            max_keywords: max_keywords.max(1),
        }
    }

    /// Analyses `text` directly. Never fails.
    pub fn extract(&self, text: &str) -> AnalysisResult {
        let sentences = split_sentences(text);
        let ranked = rank_terms(text);
        let top: Vec<(String, usize)> = ranked.into_iter().take(self.max_keywords).collect();
        let max_count = top.first().map(|(_, c)| *c).unwrap_or(1);

        let keywords = top
            .iter()
            .map(|(term, count)| Keyword {
                value: count.to_string(),
                definition: sentences
                    .iter()
                    .find(|s| s.to_lowercase().contains(term.as_str()))
                    .map(|s| truncate_chars(s, DEFINITION_MAX_CHARS))
                    .unwrap_or_default(),
                importance: clamp_score(((*count as f64 / max_count as f64) * 10.0).round() as i64),
                ..Keyword::new(term.clone())
            })
            .collect();

        let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();
        let mut relations = Vec::new();
        for (i, (source, _)) in top.iter().enumerate() {
            for (target, _) in top.iter().skip(i + 1) {
                let shared = lowered
                    .iter()
                    .filter(|s| s.contains(source.as_str()) && s.contains(target.as_str()))
                    .count();
                if shared > 0 {
                    relations.push(Relation {
                        source: source.clone(),
                        target: target.clone(),
                        label: "co-occurs".to_string(),
                        strength: clamp_score(shared as i64 * 2),
                    });
                }
            }
        }
        relations.truncate(self.max_keywords);

        AnalysisResult {
            summary: sentences
                .first()
                .map(|s| truncate_chars(s, SUMMARY_MAX_CHARS))
                .unwrap_or_default(),
            keywords,
            relations,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ModelBackend for EmbeddedBackend {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn label(&self, _tier: ModelTier) -> String {
        "embedded-extractive".to_string()
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<AnalysisResult, BackendError> {
        Ok(self.extract(request.text))
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split(|c: char| matches!(c, '.' | '!' | '?' | '\n' | '。'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Terms by frequency, ties broken by first occurrence.
fn rank_terms(text: &str) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let tokens = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !t.chars().all(|c| c.is_numeric()))
        .filter(|t| !STOPWORDS.contains(&t.as_str()));

    for (position, token) in tokens.enumerate() {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(term, (count, first))| (term, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(term, count, _)| (term, count)).collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
