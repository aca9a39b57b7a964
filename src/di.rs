//! Dependency injection infrastructure.
//!
//! Compile-time dependency injection using the `FromRef` trait and the
//! derive macros from `di-macros`.
//!
//! - `FromRef<T>`: extract a value from a reference to `T`
//! - `#[derive(Context)]`: makes each field of the root context extractable
//! - `#[derive(FromContext)]`: builds a service by resolving each field
//!
//! ```ignore
//! use crate::di::FromRef;
//!
//! #[derive(Context, Clone)]
//! pub struct Context {
//!     pub categories: Arc<CategoryRegistry>,
//!     pub rule_store: AppRuleStore,
//! }
//!
//! #[derive(FromContext, Clone)]
//! pub struct CorrelationEngine {
//!     rules: AppRuleStore, // resolved via FromRef<Context>
//! }
//!
//! let engine = CorrelationEngine::from_ref(&ctx);
//! ```
//!
//! Field types of the root context must be distinct, since each one gets
//! its own `FromRef` impl.

/// Extracts a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};
