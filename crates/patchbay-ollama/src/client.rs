// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama generate endpoint.
//!
//! Provides [`OllamaClassifier`], the [`ClassifierAdapter`] used on the
//! interception path. Each classification is a single attempt with a hard
//! timeout: a failed call costs the session its verdict, never a retry
//! delay, and the controller degrades to the default model.

use std::time::Duration;

use async_trait::async_trait;
use patchbay_config::model::ClassifierConfig;
use patchbay_core::{
    AdapterType, ClassifierAdapter, CollaboratorAdapter, HealthStatus, PatchbayError,
};
use tracing::{debug, warn};

use crate::types::{GenerateRequest, GenerateResponse};

/// Classifier client for a local Ollama-compatible generate endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClassifier {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

impl OllamaClassifier {
    /// Creates a classifier client from `[classifier]` configuration.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, PatchbayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PatchbayError::ClassifierUnavailable {
                message: format!("could not construct the HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
        })
    }

    /// Overrides the endpoint (for testing with wiremock).
    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Root URL of the serving process, derived from the generate endpoint.
    /// Ollama answers a plain GET on `/` whenever it is up.
    fn root_url(&self) -> Result<reqwest::Url, PatchbayError> {
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            PatchbayError::Config(format!("invalid classifier endpoint `{}`: {e}", self.endpoint))
        })?;
        url.set_path("/");
        url.set_query(None);
        Ok(url)
    }
}

#[async_trait]
impl CollaboratorAdapter for OllamaClassifier {
    fn name(&self) -> &str {
        "ollama-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, PatchbayError> {
        let url = self.root_url()?;
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(response) => {
                warn!(status = %response.status(), "classifier answered health check with non-success");
                Ok(HealthStatus::Degraded(format!(
                    "endpoint answered with status {}",
                    response.status()
                )))
            }
            Err(e) => {
                warn!(error = %e, "classifier unreachable during health check");
                Ok(HealthStatus::Unhealthy(format!("endpoint unreachable: {e}")))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), PatchbayError> {
        debug!("ollama classifier shutting down");
        Ok(())
    }
}

#[async_trait]
impl ClassifierAdapter for OllamaClassifier {
    async fn classify(&self, prompt: &str) -> Result<String, PatchbayError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PatchbayError::ClassifierUnavailable {
                message: format!("request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatchbayError::ClassifierUnavailable {
                message: format!("classifier returned {status}: {body}"),
                source: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PatchbayError::ClassifierUnavailable {
                message: format!("failed to read classifier response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let generate: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| PatchbayError::ClassifierUnavailable {
                message: format!("failed to parse classifier response: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(
            model = %self.model,
            reply = %generate.response.replace('\n', "\\n"),
            "classifier verdict received"
        );
        Ok(generate.response)
    }
}
