//! Input-shape classification.

use crate::models::{RawInput, RouteTag};

/// Route hints that force non-list input onto the text route.
const TEXT_ROUTE_HINTS: &[&str] = &["document_analysis", "file_analysis"];

/// Chooses a processing route from the input shape and the caller's hint.
///
/// Total over all inputs: lists are always tabular, a document hint sends
/// everything else to text, objects become diagrams, the rest is text.
pub fn classify(route_hint: &str, raw: &RawInput) -> RouteTag {
    if matches!(raw, RawInput::Rows(_)) {
        return RouteTag::Tabular;
    }
    if TEXT_ROUTE_HINTS.contains(&route_hint) {
        return RouteTag::Text;
    }
    match raw {
        RawInput::Object(_) => RouteTag::Structured,
        _ => RouteTag::Text,
    }
}
