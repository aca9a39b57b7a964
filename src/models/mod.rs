//! Domain models for the mapping pipeline.

mod analysis;
mod category;
mod graph;
mod input;
mod knowledge;
mod rule;

pub use analysis::{
    clamp_score, AnalysisResult, Keyword, Reference, Relation, NO_MODEL, SCORE_MAX, SCORE_MIN,
};
pub use category::{Category, CategoryRegistry, ModelTier, DEFAULT_CATEGORY_ID};
pub use graph::{Graph, GraphSummary, Link, MappingRecord, Node, NodeType};
pub use input::{MappingOptions, RawInput, RenderType, RouteTag, Row, RowTable};
pub use knowledge::{KnowledgeItem, KnowledgeScope};
pub use rule::CorrelationRule;

/// Generate a new ULID string.
pub fn generate_ulid() -> String {
    ulid::Ulid::new().to_string()
}
