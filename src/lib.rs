//! QuantumViz - data-to-3D-graph analysis pipeline
//!
//! Turns free text, tabular rows and structured objects into positioned
//! node/link graphs, with tiered model analysis, knowledge retrieval and
//! rule-based correlation along the way.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
