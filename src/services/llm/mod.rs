//! Tiered model routing.
//!
//! A [`ModelRouter`] holds an ordered list of [`Strategy`] values, each
//! wrapping one [`ModelBackend`]. Strategies are tried strictly in order with
//! no retries; the first accepted result wins. Every failure is logged and
//! swallowed, so analysis always yields a result.
//!
//! Default chain:
//!
//! 1. [`CloudBackend`] - any tier, gated by the shared [`RateWindow`]
//! 2. [`LocalBackend`] - FLASH/PRO only, result must carry keywords
//! 3. [`EmbeddedBackend`] - extractive fallback, never fails

mod cloud;
mod embedded;
mod local;
mod prompt;
mod rate_limit;
mod response;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::error::BackendError;
use crate::models::{AnalysisResult, ModelTier};
use crate::services::category::ResolvedCategory;

pub use cloud::CloudBackend;
pub use embedded::EmbeddedBackend;
pub use local::LocalBackend;
pub use prompt::{PromptBuilder, NO_KNOWLEDGE};
pub use rate_limit::{Clock, RateWindow, SystemClock};
pub use response::{parse, try_parse};

#[cfg(test)]
pub(crate) use rate_limit::testing::ManualClock;

/// One analysis request as seen by a backend.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    /// Full instruction block.
    pub prompt: &'a str,
    /// Untruncated input text, for backends that work on the text directly.
    pub text: &'a str,
    pub category: &'a ResolvedCategory,
}

impl ModelRequest<'_> {
    pub fn tier(&self) -> ModelTier {
        self.category.tier
    }
}

/// A model provider.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short backend name for logs (`cloud`, `local`, `embedded`).
    fn name(&self) -> &'static str;

    /// Model label recorded in results for `tier`.
    fn label(&self, tier: ModelTier) -> String;

    /// Whether this backend serves `tier` at all.
    fn supports(&self, _tier: ModelTier) -> bool {
        true
    }

    /// Whether the backend has the configuration it needs.
    fn is_configured(&self) -> bool {
        true
    }

    /// Cheap liveness probe run before each generation.
    async fn check_health(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<AnalysisResult, BackendError>;
}

/// Extra condition a backend result must meet to end the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Any,
    NonEmptyKeywords,
}

/// A backend plus the gate and acceptance rule it runs under.
#[derive(Clone)]
pub struct Strategy {
    backend: Arc<dyn ModelBackend>,
    gate: Option<Arc<RateWindow>>,
    acceptance: Acceptance,
}

impl Strategy {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            gate: None,
            acceptance: Acceptance::Any,
        }
    }

    /// Counts each attempt against `window` and skips the backend when full.
    pub fn rate_limited(mut self, window: Arc<RateWindow>) -> Self {
        self.gate = Some(window);
        self
    }

    pub fn accept(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// Runs the backend once. `None` means fall through to the next strategy.
    pub async fn attempt(&self, request: &ModelRequest<'_>) -> Option<AnalysisResult> {
        let name = self.backend.name();
        let tier = request.tier();

        if !self.backend.supports(tier) {
            tracing::debug!(backend = name, tier = %tier, "Backend skipped for tier");
            return None;
        }
        if !self.backend.is_configured() {
            tracing::debug!(backend = name, "Backend not configured");
            return None;
        }
        if let Some(window) = &self.gate {
            if !window.check_and_record() {
                tracing::info!(backend = name, "Rate window exhausted, falling through");
                return None;
            }
        }
        if let Err(err) = self.backend.check_health().await {
            tracing::warn!(backend = name, error = %err, "Health check failed");
            return None;
        }

        let result = match self.backend.generate(request).await {
            Ok(result) => result,
            Err(err) if err.is_quota() => {
                tracing::warn!(backend = name, error = %err, "Quota exceeded, falling through");
                return None;
            }
            Err(err) => {
                tracing::warn!(backend = name, error = %err, "Backend unavailable, falling through");
                return None;
            }
        };

        if self.acceptance == Acceptance::NonEmptyKeywords && result.keywords.is_empty() {
            tracing::info!(backend = name, "Result rejected: no keywords");
            return None;
        }

        tracing::info!(backend = name, model = %self.backend.label(tier), "Analysis complete");
        Some(AnalysisResult {
            model_used: self.backend.label(tier),
            ..result
        })
    }
}

/// Ordered fallback chain across model backends.
#[derive(Clone)]
pub struct ModelRouter {
    strategies: Vec<Strategy>,
}

impl ModelRouter {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Default chain built from configuration.
    pub fn from_config(config: &Config, http: reqwest::Client, window: Arc<RateWindow>) -> Self {
        let mut strategies = vec![Strategy::new(Arc::new(CloudBackend::new(
            config.cloud.clone(),
            http.clone(),
        )))
        .rate_limited(window)];

        if config.local.enabled {
            strategies.push(
                Strategy::new(Arc::new(LocalBackend::new(config.local.clone(), http)))
                    .accept(Acceptance::NonEmptyKeywords),
            );
        }
        strategies.push(Strategy::new(Arc::new(EmbeddedBackend::new(
            config.embedded.max_keywords,
        ))));

        Self::new(strategies)
    }

    /// Strategy names in chain order.
    pub fn chain(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    /// Tries each strategy in turn. Never fails.
    ///
    /// The result's `model_tier` is the category tier, or `none` when no
    /// strategy produced anything.
    pub async fn analyze(&self, request: &ModelRequest<'_>) -> AnalysisResult {
        for strategy in &self.strategies {
            if let Some(result) = strategy.attempt(request).await {
                return AnalysisResult {
                    model_tier: request.tier().to_string(),
                    ..result
                };
            }
        }
        tracing::warn!(category = %request.category.id, "No model backend produced a result");
        AnalysisResult::empty()
    }
}

impl FromRef<Context> for ModelRouter {
    fn from_ref(ctx: &Context) -> Self {
        Self::from_config(&ctx.config, ctx.http.clone(), ctx.rate_window.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::models::Keyword;

    /// Backend returning a canned result and counting calls.
    struct FakeBackend {
        name: &'static str,
        calls: AtomicUsize,
        outcome: fn() -> Result<AnalysisResult, BackendError>,
        tiers: &'static [ModelTier],
    }

    impl FakeBackend {
        fn new(name: &'static str, outcome: fn() -> Result<AnalysisResult, BackendError>) -> Self {
            Self {
                name,
                calls: AtomicUsize::new(0),
                outcome,
                tiers: &[ModelTier::Local, ModelTier::Flash, ModelTier::Pro],
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelBackend for FakeBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        fn label(&self, tier: ModelTier) -> String {
            format!("{}-{}", self.name, tier)
        }

        fn supports(&self, tier: ModelTier) -> bool {
            self.tiers.contains(&tier)
        }

        async fn generate(
            &self,
            _request: &ModelRequest<'_>,
        ) -> Result<AnalysisResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn with_keywords() -> Result<AnalysisResult, BackendError> {
        Ok(AnalysisResult {
            summary: "ok".into(),
            keywords: vec![Keyword::new("vat")],
            ..Default::default()
        })
    }

    fn without_keywords() -> Result<AnalysisResult, BackendError> {
        Ok(AnalysisResult::default())
    }

    fn quota() -> Result<AnalysisResult, BackendError> {
        Err(BackendError::from_status(429, "quota"))
    }

    fn category(tier: ModelTier) -> ResolvedCategory {
        ResolvedCategory {
            id: "TEST".into(),
            tier,
            description: "test".into(),
        }
    }

    fn request(category: &ResolvedCategory) -> ModelRequest<'_> {
        ModelRequest {
            prompt: "prompt",
            text: "text",
            category,
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let cloud = Arc::new(FakeBackend::new("cloud", with_keywords));
        let local = Arc::new(FakeBackend::new("local", with_keywords));
        let router = ModelRouter::new(vec![Strategy::new(cloud.clone()), Strategy::new(local.clone())]);

        let cat = category(ModelTier::Pro);
        let result = router.analyze(&request(&cat)).await;
        assert_eq!(result.model_used, "cloud-pro");
        assert_eq!(result.model_tier, "pro");
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn test_quota_falls_through() {
        let cloud = Arc::new(FakeBackend::new("cloud", quota));
        let local = Arc::new(FakeBackend::new("local", with_keywords));
        let router = ModelRouter::new(vec![Strategy::new(cloud.clone()), Strategy::new(local)]);

        let cat = category(ModelTier::Flash);
        let result = router.analyze(&request(&cat)).await;
        assert_eq!(result.model_used, "local-flash");
        assert_eq!(cloud.calls(), 1);
    }

    #[tokio::test]
    async fn test_keyword_acceptance_rejects_empty_result() {
        let local = Arc::new(FakeBackend::new("local", without_keywords));
        let embedded = Arc::new(FakeBackend::new("embedded", without_keywords));
        let router = ModelRouter::new(vec![
            Strategy::new(local).accept(Acceptance::NonEmptyKeywords),
            Strategy::new(embedded),
        ]);

        let cat = category(ModelTier::Flash);
        assert_eq!(router.analyze(&request(&cat)).await.model_used, "embedded-flash");
    }

    #[tokio::test]
    async fn test_unsupported_tier_skipped() {
        let mut local = FakeBackend::new("local", with_keywords);
        local.tiers = &[ModelTier::Flash, ModelTier::Pro];
        let local = Arc::new(local);
        let embedded = Arc::new(FakeBackend::new("embedded", with_keywords));
        let router = ModelRouter::new(vec![Strategy::new(local.clone()), Strategy::new(embedded)]);

        let cat = category(ModelTier::Local);
        assert_eq!(router.analyze(&request(&cat)).await.model_used, "embedded-local");
        assert_eq!(local.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_empty() {
        let router = ModelRouter::new(vec![Strategy::new(Arc::new(FakeBackend::new("cloud", quota)))]);
        let cat = category(ModelTier::Pro);
        let result = router.analyze(&request(&cat)).await;
        assert_eq!(result.model_tier, "none");
        assert!(result.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_fifteenth_request_routes_to_local_until_window_ages_out() {
        let clock = Arc::new(ManualClock::new());
        let window = Arc::new(RateWindow::with_clock(14, 60, clock.clone()));
        let cloud = Arc::new(FakeBackend::new("cloud", with_keywords));
        let local = Arc::new(FakeBackend::new("local", with_keywords));
        let router = ModelRouter::new(vec![
            Strategy::new(cloud.clone()).rate_limited(window),
            Strategy::new(local.clone()).accept(Acceptance::NonEmptyKeywords),
        ]);
        let cat = category(ModelTier::Flash);

        for _ in 0..14 {
            assert_eq!(router.analyze(&request(&cat)).await.model_used, "cloud-flash");
        }
        assert_eq!(router.analyze(&request(&cat)).await.model_used, "local-flash");
        assert_eq!(cloud.calls(), 14);
        assert_eq!(local.calls(), 1);

        clock.advance(Duration::from_secs(60));
        assert_eq!(router.analyze(&request(&cat)).await.model_used, "cloud-flash");
        assert_eq!(cloud.calls(), 15);
    }

    #[test]
    fn test_default_chain_order() {
        let router = ModelRouter::from_config(
            &Config::default(),
            reqwest::Client::new(),
            Arc::new(RateWindow::new(14, 60)),
        );
        assert_eq!(router.chain(), vec!["cloud", "local", "embedded"]);
    }

    #[tokio::test]
    async fn test_embedded_closes_chain_without_other_backends() {
        let mut config = Config::default();
        config.local.enabled = false;
        let router = ModelRouter::from_config(
            &config,
            reqwest::Client::new(),
            Arc::new(RateWindow::new(14, 60)),
        );
        assert_eq!(router.chain(), vec!["cloud", "embedded"]);

        let cat = category(ModelTier::Flash);
        let request = ModelRequest {
            prompt: "prompt",
            text: "Payment settlement for invoice. Payment was received via card.",
            category: &cat,
        };
        let result = router.analyze(&request).await;
        assert_eq!(result.model_used, "embedded-extractive");
        assert_eq!(result.model_tier, "flash");
        assert!(!result.keywords.is_empty());
    }
}
