//! Pipeline stages and the service that runs them.
//!
//! Stateless stages (classification, table parsing, layout, correlation
//! matching, sanitization) are plain functions or small value types.
//! Stages that need shared state resolve it from the [`Context`] through the
//! `FromContext` derive macro.
//!
//! [`Context`]: crate::context::Context

pub mod category;
pub mod classifier;
pub mod correlation;
pub mod knowledge;
pub mod layout;
pub mod llm;
pub mod pipeline;
pub mod sanitizer;
pub mod table_parser;

pub use category::{CategoryDetector, ResolvedCategory};
pub use correlation::CorrelationEngine;
pub use knowledge::KnowledgeRetriever;
pub use layout::LayoutEngine;
pub use llm::ModelRouter;
pub use pipeline::MappingService;
