//! Application error types.
//!
//! Pipeline-internal failures (backend outages, malformed model output,
//! unparseable tables, unsafe references) degrade in place and are only
//! logged. `AppError` covers what does propagate: store I/O and
//! configuration.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Store query failed: {message}")]
    Query { message: String, query: String },

    #[error("Failed to persist mapping: {0}")]
    Persist(String),

    // Serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a [`AppError::Query`] keeping the failing statement for logs.
    pub fn query(err: impl std::fmt::Display, query: &str) -> Self {
        AppError::Query {
            message: err.to_string(),
            query: query.to_string(),
        }
    }
}

/// Failure of a single model backend attempt.
///
/// Never leaves the router: each variant is logged and the next strategy in
/// the chain is tried.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The provider reported quota exhaustion or throttling.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// Non-success status, missing configuration, failed health check.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered but the payload had no usable text.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Classifies a non-success response from a cloud provider.
    ///
    /// 429/403 and bodies mentioning "quota" or "rate limit" are quota-class;
    /// everything else is a plain outage.
    pub fn from_status(status: u16, body: &str) -> Self {
        let lowered = body.to_lowercase();
        if status == 429
            || status == 403
            || lowered.contains("quota")
            || lowered.contains("rate limit")
        {
            BackendError::Quota(format!("HTTP {status}: {}", truncate(body, 200)))
        } else {
            BackendError::Unavailable(format!("HTTP {status}: {}", truncate(body, 200)))
        }
    }

    /// Returns true for quota-class failures.
    pub fn is_quota(&self) -> bool {
        matches!(self, BackendError::Quota(_))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
