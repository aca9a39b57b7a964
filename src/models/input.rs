//! Pipeline input shapes and caller options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One tabular row. Column order is preserved.
pub type Row = Map<String, Value>;

/// A list of rows, either supplied by the caller or parsed from text.
pub type RowTable = Vec<Row>;

/// Raw pipeline input. Exactly one shape per request.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// Free text or text extracted from a document.
    Text(String),
    /// Row-oriented data (spreadsheet, CSV export).
    Rows(RowTable),
    /// A single structured object.
    Object(Map<String, Value>),
}

impl From<Value> for RawInput {
    /// Arrays become rows (non-object elements wrapped as `{"value": x}`),
    /// objects stay objects, strings are text and every other scalar is
    /// coerced to its JSON text.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => RawInput::Rows(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(row) => row,
                        other => {
                            let mut row = Map::new();
                            row.insert("value".to_string(), other);
                            row
                        }
                    })
                    .collect(),
            ),
            Value::Object(map) => RawInput::Object(map),
            Value::String(text) => RawInput::Text(text),
            other => RawInput::Text(other.to_string()),
        }
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        RawInput::Text(text)
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        RawInput::Text(text.to_string())
    }
}

impl RawInput {
    /// Text form used when a non-text input is forced onto the text route.
    pub fn to_text(&self) -> String {
        match self {
            RawInput::Text(text) => text.clone(),
            RawInput::Rows(rows) => {
                serde_json::to_string(rows).unwrap_or_else(|_| format!("{rows:?}"))
            }
            RawInput::Object(map) => {
                serde_json::to_string(map).unwrap_or_else(|_| format!("{map:?}"))
            }
        }
    }
}

/// Processing route chosen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTag {
    /// Row data, rendered as a settlement layout.
    Tabular,
    /// Structured object, rendered as a key/value diagram.
    Structured,
    /// Text: table parsing first, then model analysis.
    Text,
}

/// Caller's rendering preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RenderType {
    #[default]
    Auto,
    Diagram,
    Settlement,
}

impl RenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderType::Auto => "auto",
            RenderType::Diagram => "diagram",
            RenderType::Settlement => "settlement",
        }
    }
}

/// Options recognised by `process_to_graph`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    pub render_type: RenderType,
    pub main_category: Option<String>,
    pub sub_category: Option<String>,
    /// Name of the uploaded file when the input came from a document.
    pub filename: Option<String>,
}

impl MappingOptions {
    /// Explicit `"{main}_{sub}"` category when both hints are present.
    pub fn explicit_category(&self) -> Option<String> {
        match (non_blank(&self.main_category), non_blank(&self.sub_category)) {
            (Some(main), Some(sub)) => Some(format!("{main}_{sub}")),
            _ => None,
        }
    }

    /// Main category hint, if any.
    pub fn main_category(&self) -> Option<&str> {
        non_blank(&self.main_category)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
