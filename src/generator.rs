//! Text generation collaborators
//!
//! Narratives and descriptions come from a local LLM server. Callers only
//! see the [`TextGenerator`] trait and always have a fallback text ready,
//! so a generation failure never fails a request.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::GeneratorConfig;
use crate::{Result, TourPlanError};

/// A single prompt sent to a generator
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce free text for a prompt. One attempt, no retries.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Generator backed by an Ollama server's `/api/generate` endpoint
pub struct OllamaGenerator {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("TourPlan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TourPlanError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.model.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    #[instrument(name = "generate_text", skip_all, fields(model = %self.model, temperature = request.temperature))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let start_time = Instant::now();
        let body = OllamaRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Generator request failed: {}", e);
                TourPlanError::generation(format!("request to {} failed: {e}", self.endpoint))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Generator responded with status {}", status);
            return Err(TourPlanError::generation(format!(
                "generator responded with status {status}"
            )));
        }

        let payload: OllamaResponse = response.json().await.map_err(|e| {
            TourPlanError::generation(format!("invalid generator response: {e}"))
        })?;

        debug!(
            "Generated {} chars in {:.3}s",
            payload.response.chars().count(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(payload.response)
    }
}

/// Generator used when generation is switched off; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

#[async_trait]
impl TextGenerator for OfflineGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(TourPlanError::generation("text generation is disabled"))
    }
}
