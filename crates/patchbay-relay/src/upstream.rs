// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-attempt upstream dispatcher.

use std::time::Duration;

use patchbay_config::model::UpstreamConfig;
use patchbay_core::{InterceptedRequest, PatchbayError};
use tracing::debug;

use crate::body::RelayResponse;

/// Headers never copied onto the outbound call; the HTTP client computes
/// its own framing and target.
const SKIPPED_HEADERS: [&str; 4] = ["host", "content-length", "connection", "transfer-encoding"];

/// Dispatches intercepted calls to the configured origin.
///
/// One attempt per call, with a connect timeout but no total timeout, so
/// long-lived streamed responses are never cut off mid-body.
pub struct Upstream {
    http: reqwest::Client,
    origin: String,
}

impl Upstream {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, PatchbayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| PatchbayError::UpstreamDispatch {
                message: format!("failed to build upstream client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            origin: config.origin.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute target for `url`, resolving origin-relative paths against
    /// the configured origin.
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.origin, url)
        }
    }

    /// Sends one call upstream with the intercepted method, headers, and
    /// credentials, and the given body. The response is returned unread.
    pub async fn dispatch(
        &self,
        request: &InterceptedRequest,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, PatchbayError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            PatchbayError::UpstreamDispatch {
                message: format!("invalid method {:?}: {e}", request.method),
                source: Some(Box::new(e)),
            }
        })?;
        let url = self.resolve(&request.url);

        let mut builder = self.http.request(method, &url);
        for (name, value) in &request.headers {
            if SKIPPED_HEADERS
                .iter()
                .any(|skipped| name.eq_ignore_ascii_case(skipped))
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        debug!(
            method = %request.method,
            url = %url,
            credentials = %request.credentials,
            "dispatching upstream"
        );
        builder
            .send()
            .await
            .map_err(|e| PatchbayError::UpstreamDispatch {
                message: format!("upstream call to {url} failed: {e}"),
                source: Some(Box::new(e)),
            })
    }

    /// Forwards an intercepted request unmodified, keeping the real
    /// upstream envelope.
    pub async fn forward(&self, request: &InterceptedRequest) -> Result<RelayResponse, PatchbayError> {
        let response = self.dispatch(request, request.body.clone()).await?;
        Ok(RelayResponse::passthrough(response))
    }
}
