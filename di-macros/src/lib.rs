//! Dependency injection derives for the QuantumViz pipeline.
//!
//! - `#[derive(Context)]` exposes every field of the root context through
//!   `crate::FromRef`, so stores, the category registry and the rate window
//!   can be pulled out of it by type.
//! - `#[derive(FromContext)]` builds a service by resolving each of its
//!   fields from the context.
//!
//! Generated code names `crate::FromRef`, so the consuming crate re-exports
//! the trait at its root.

use proc_macro::TokenStream;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Field, Fields};

mod context;
mod from_context;

/// Derive `FromRef<Self>` for the type of every named field.
///
/// ```ignore
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub config: Arc<Config>,
///     pub rate_window: Arc<RateWindow>,
/// }
///
/// // impl FromRef<Context> for Arc<Config> { ... }
/// // impl FromRef<Context> for Arc<RateWindow> { ... }
/// ```
///
/// Field types must be distinct and `Clone`.
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Derive `FromRef<Context>` for a service whose fields all resolve from the
/// context.
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct KnowledgeRetriever {
///     store: AppKnowledgeStore,
/// }
/// ```
///
/// The context type defaults to `Context`; override it with
/// `#[from_context(Context = "TestContext")]`.
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}

/// Named fields of a struct, or a spanned compile error for any other shape.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive_name: &str,
) -> Result<&'a Punctuated<Field, Comma>, syn::Error> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive_name} requires a struct with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive_name} can only be derived for structs"),
        )),
    }
}
