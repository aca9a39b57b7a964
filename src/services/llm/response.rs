//! Extraction of structured analysis from model output.
//!
//! Structured-output modes usually return bare JSON. Models without one wrap
//! it in prose or a Markdown fence, so extraction falls back through
//! progressively looser patterns.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::AnalysisResult;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("Invalid regex"));

static GREEDY_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex"));

/// Parses model output, returning `None` when no JSON object is found.
pub fn try_parse(text: &str) -> Option<AnalysisResult> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(result) = AnalysisResult::from_value(&value) {
            return Some(result);
        }
    }

    if let Some(result) = FENCED_JSON
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str().trim()).ok())
        .and_then(|v| AnalysisResult::from_value(&v))
    {
        return Some(result);
    }

    GREEDY_OBJECT
        .find(trimmed)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .and_then(|v| AnalysisResult::from_value(&v))
}

/// Parses model output, falling back to a fixed failure result.
///
/// Public entry point for callers holding raw model text. Backends inside
/// the router use [`try_parse`] instead, so a miss becomes
/// [`BackendError::Malformed`](crate::error::BackendError::Malformed) and
/// the chain moves on to the next strategy.
pub fn parse(text: &str) -> AnalysisResult {
    try_parse(text).unwrap_or_else(|| {
        tracing::warn!(len = text.len(), "Model output contained no usable JSON");
        AnalysisResult::parse_failure()
    })
}
