//! Self-hosted model backend (Ollama-compatible API).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LocalConfig;
use crate::error::BackendError;
use crate::models::{AnalysisResult, ModelTier};

use super::{try_parse, ModelBackend, ModelRequest};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Local backend. LOCAL-tier categories skip it.
pub struct LocalBackend {
    config: LocalConfig,
    http: reqwest::Client,
}

impl LocalBackend {
    pub fn new(config: LocalConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ModelBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn label(&self, _tier: ModelTier) -> String {
        self.config.model.clone()
    }

    fn supports(&self, tier: ModelTier) -> bool {
        matches!(tier, ModelTier::Flash | ModelTier::Pro)
    }

    async fn check_health(&self) -> Result<(), BackendError> {
        let response = self
            .http
            .get(self.endpoint("/api/tags"))
            .timeout(Duration::from_secs(self.config.health_timeout_secs))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<AnalysisResult, BackendError> {
        tracing::debug!(model = %self.config.model, category = %request.category.id, "Local request");
        let body = GenerateRequest {
            model: &self.config.model,
            prompt: request.prompt,
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: 0.2,
                top_p: 0.9,
            },
        };

        let response = self
            .http
            .post(self.endpoint("/api/generate"))
            .timeout(Duration::from_secs(self.config.generate_timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Unavailable(format!("HTTP {status}: {text}")));
        }

        let body: GenerateResponse = response.json().await?;
        try_parse(&body.response)
            .ok_or_else(|| BackendError::Malformed("local response is not an analysis object".into()))
    }
}
