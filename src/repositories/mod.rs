//! Data access layer.
//!
//! The pipeline talks to three stores through traits so the Postgres
//! backend can be swapped for the in-memory one when no database is
//! configured.

mod memory;
mod postgres;
mod traits;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use traits::{KnowledgeStore, MappingStore, RuleStore};
