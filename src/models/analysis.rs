//! Structured analysis produced by a model backend.
//!
//! Model output is untrusted: fields may be missing, mistyped, or out of
//! range. [`AnalysisResult::from_value`] accepts whatever shape it can and
//! normalises it; nothing here fails on bad content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Row;

/// Lower and upper bound for importance and strength scores.
pub const SCORE_MIN: u8 = 1;
pub const SCORE_MAX: u8 = 10;
const SCORE_DEFAULT: u8 = 5;

/// Tier marker used when no backend produced a result.
pub const NO_MODEL: &str = "none";

/// Clamps a score into `[1, 10]`.
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(SCORE_MIN as i64, SCORE_MAX as i64) as u8
}

/// External reference attached to a keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Raw value as produced by the model; validated by the sanitizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Reference {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.snippet.is_none()
    }
}

/// A key term extracted from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub definition: String,
    pub importance: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

impl Keyword {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            value: String::new(),
            definition: String::new(),
            importance: SCORE_DEFAULT,
            references: Vec::new(),
        }
    }
}

/// A directed relation between two terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    pub label: String,
    pub strength: u8,
}

/// Analysis of one text input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub keywords: Vec<Keyword>,
    pub relations: Vec<Relation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_render: Option<String>,
    #[serde(default)]
    pub detected_category: String,
    /// Tier of the detected category, or `none` when every backend failed.
    #[serde(default)]
    pub model_tier: String,
    /// Label of the backend/model that produced the result.
    #[serde(default)]
    pub model_used: String,
    #[serde(default)]
    pub rag_applied: bool,
}

impl AnalysisResult {
    /// Result used when no backend produced anything.
    pub fn empty() -> Self {
        Self {
            model_tier: NO_MODEL.to_string(),
            model_used: NO_MODEL.to_string(),
            ..Default::default()
        }
    }

    /// Result used when model output could not be parsed.
    pub fn parse_failure() -> Self {
        Self {
            summary: "Failed to parse the model response".to_string(),
            ..Default::default()
        }
    }

    /// Builds a result from any JSON value, keeping what is usable.
    ///
    /// Returns `None` only when `value` is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let keywords = array(object, "keywords")
            .iter()
            .filter_map(keyword_from_value)
            .collect();
        let relations = array(object, "relations")
            .iter()
            .filter_map(relation_from_value)
            .collect();
        let table_data = array(object, "table_data")
            .iter()
            .filter_map(|row| row.as_object().cloned())
            .collect();

        Some(Self {
            summary: text(object.get("summary")).unwrap_or_default(),
            keywords,
            relations,
            table_data,
            suggested_render: text(object.get("suggested_render")),
            ..Default::default()
        })
    }
}

fn array<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// String content of a scalar; numbers and booleans are rendered as text.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer score from a number or numeric string, clamped; default 5.
fn score(value: Option<&Value>) -> u8 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().map(|f| f.round() as i64),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    };
    parsed.map(clamp_score).unwrap_or(SCORE_DEFAULT)
}

fn keyword_from_value(value: &Value) -> Option<Keyword> {
    match value {
        Value::String(term) if !term.trim().is_empty() => Some(Keyword::new(term.trim())),
        Value::Object(object) => {
            let term = text(object.get("term"))
                .or_else(|| text(object.get("keyword")))
                .or_else(|| text(object.get("name")))?;
            if term.trim().is_empty() {
                return None;
            }
            let references = object
                .get("references")
                .and_then(Value::as_array)
                .map(|refs| {
                    refs.iter()
                        .filter_map(|r| {
                            let r = r.as_object()?;
                            Some(Reference {
                                title: text(r.get("title")),
                                url: r.get("url").filter(|u| !u.is_null()).cloned(),
                                snippet: text(r.get("snippet")),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Some(Keyword {
                term: term.trim().to_string(),
                value: text(object.get("value")).unwrap_or_default(),
                definition: text(object.get("definition")).unwrap_or_default(),
                importance: score(object.get("importance")),
                references,
            })
        }
        _ => None,
    }
}

fn relation_from_value(value: &Value) -> Option<Relation> {
    let object = value.as_object()?;
    Some(Relation {
        source: text(object.get("source"))?,
        target: text(object.get("target"))?,
        label: text(object.get("label")).unwrap_or_else(|| "related".to_string()),
        strength: score(object.get("strength")),
    })
}
