//! Hosted model backend (Gemini `generateContent` REST API).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::CloudConfig;
use crate::error::BackendError;
use crate::models::{AnalysisResult, ModelTier};

use super::{try_parse, ModelBackend, ModelRequest};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Cloud backend. PRO requests use the pro model with search grounding;
/// every other tier uses the flash model in JSON response mode.
pub struct CloudBackend {
    config: CloudConfig,
    http: reqwest::Client,
}

impl CloudBackend {
    pub fn new(config: CloudConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Pro => &self.config.pro_model,
            _ => &self.config.flash_model,
        }
    }

    fn request_body<'a>(prompt: &'a str, tier: ModelTier) -> GenerateRequest<'a> {
        let contents = vec![Content {
            parts: vec![Part { text: prompt }],
        }];
        match tier {
            // Grounding tools and JSON response mode cannot be combined.
            ModelTier::Pro => GenerateRequest {
                contents,
                generation_config: None,
                tools: Some(json!([{ "google_search": {} }])),
            },
            _ => GenerateRequest {
                contents,
                generation_config: Some(json!({ "responseMimeType": "application/json" })),
                tools: None,
            },
        }
    }
}

#[async_trait]
impl ModelBackend for CloudBackend {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn label(&self, tier: ModelTier) -> String {
        self.model(tier).to_string()
    }

    fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<AnalysisResult, BackendError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::Unavailable("no API key configured".into()))?;
        let tier = request.tier();
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.model(tier)
        );

        tracing::debug!(model = %self.model(tier), category = %request.category.id, "Cloud request");
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&Self::request_body(request.prompt, tier))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BackendError::Malformed("response has no candidate text".into()))?;

        try_parse(&text)
            .ok_or_else(|| BackendError::Malformed("candidate text is not an analysis object".into()))
    }
}
