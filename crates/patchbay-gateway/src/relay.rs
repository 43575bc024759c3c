// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gateway's catch-all relay handler.
//!
//! Every request that is not an admin call lands here, gets materialized
//! into an `InterceptedRequest`, and is offered to the installed
//! interceptor. With no interceptor installed the gateway forwards
//! verbatim, so the proxy stays transparent even before `serve` finishes
//! wiring the relay.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use patchbay_core::{CredentialsMode, InterceptedRequest};
use patchbay_relay::{interceptor, RelayResponse};

use crate::server::GatewayState;

/// Response headers never copied onto the re-served response; hyper
/// recomputes framing for the outbound body.
const SKIPPED_HEADERS: [&str; 3] = ["content-length", "transfer-encoding", "connection"];

/// Fallback handler: materialize, offer to the interceptor, stream back.
pub async fn relay_handler(State(state): State<GatewayState>, request: Request) -> Response {
    let intercepted = match materialize(request, state.max_body_bytes).await {
        Ok(intercepted) => intercepted,
        Err(response) => return response,
    };

    let relayed = match interceptor::current() {
        Some(interceptor) => interceptor.handle(intercepted).await,
        None => {
            debug!("no interceptor installed, forwarding verbatim");
            state.upstream.forward(&intercepted).await
        }
    };

    match relayed {
        Ok(response) => into_axum(response),
        Err(e) => {
            warn!(error = %e, "relay failed");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// Snapshot an inbound axum request into the form the relay works on.
///
/// The URL keeps its query string; the credentials mode is derived from
/// the presence of credential-bearing headers, which ride along in the
/// header list either way.
async fn materialize(request: Request, max_body_bytes: usize) -> Result<InterceptedRequest, Response> {
    let (parts, body) = request.into_parts();

    let url = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let method = parts.method.as_str().to_string();

    let mut headers = Vec::new();
    let mut has_credentials = false;
    for (name, value) in parts.headers.iter() {
        let value = match value.to_str() {
            Ok(value) => value,
            Err(_) => continue,
        };
        if name == "authorization" || name == "cookie" {
            has_credentials = true;
        }
        headers.push((name.as_str().to_string(), value.to_string()));
    }

    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| {
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body exceeds the configured limit: {e}"),
            )
                .into_response()
        })?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(bytes.to_vec())
    };

    Ok(InterceptedRequest {
        url,
        method,
        headers,
        credentials: if has_credentials {
            CredentialsMode::Include
        } else {
            CredentialsMode::Omit
        },
        body,
    })
}

/// Rebuild an axum response around the relayed envelope and body stream.
fn into_axum(relayed: RelayResponse) -> Response {
    let mut builder = axum::http::Response::builder().status(relayed.status);
    for (name, value) in &relayed.headers {
        if SKIPPED_HEADERS
            .iter()
            .any(|skipped| name.eq_ignore_ascii_case(skipped))
        {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    match builder.body(Body::from_stream(relayed.body)) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "relayed envelope could not be rebuilt");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use patchbay_config::model::UpstreamConfig;
    use patchbay_relay::Upstream;
    use patchbay_test_utils::MemoryPreferenceStore;
    use tower::ServiceExt;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::server::build_router;

    fn test_state(origin: &str) -> GatewayState {
        let upstream_config = UpstreamConfig {
            origin: origin.to_string(),
            ..UpstreamConfig::default()
        };
        GatewayState {
            preferences: Arc::new(MemoryPreferenceStore::new()),
            upstream: Arc::new(Upstream::from_config(&upstream_config).unwrap()),
            max_body_bytes: 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn requests_forward_verbatim_without_an_interceptor() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("x-client", "settings-page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-upstream", "origin")
                    .set_body_bytes(b"model list".to_vec()),
            )
            .expect(1)
            .mount(&upstream)
            .await;

        let app = build_router(test_state(&upstream.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/models")
                    .header("x-client", "settings-page")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response
                .headers()
                .get("x-upstream")
                .and_then(|v| v.to_str().ok()),
            Some("origin")
        );
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"model list");
    }

    #[tokio::test]
    async fn query_strings_reach_the_upstream() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&upstream)
            .await;

        let app = build_router(test_state(&upstream.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/models?limit=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected_before_dispatch() {
        let upstream = MockServer::start().await;
        let mut state = test_state(&upstream.uri());
        state.max_body_bytes = 8;

        let app = build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/chat/completions")
                    .body(Body::from("this body is far beyond eight bytes"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn an_unreachable_upstream_yields_a_bad_gateway() {
        let app = build_router(test_state("http://127.0.0.1:9"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn credential_headers_set_the_include_mode() {
        let request = Request::builder()
            .uri("/v1/chat/completions")
            .header("authorization", "Bearer token")
            .body(Body::empty())
            .unwrap();
        let intercepted = materialize(request, 1024).await.unwrap();
        assert_eq!(intercepted.credentials, CredentialsMode::Include);
        assert_eq!(intercepted.header("authorization"), Some("Bearer token"));

        let bare = Request::builder()
            .uri("/v1/chat/completions")
            .body(Body::empty())
            .unwrap();
        let intercepted = materialize(bare, 1024).await.unwrap();
        assert_eq!(intercepted.credentials, CredentialsMode::Omit);
    }

    #[tokio::test]
    async fn empty_bodies_materialize_as_none() {
        let request = Request::builder()
            .uri("/v1/models")
            .body(Body::empty())
            .unwrap();
        let intercepted = materialize(request, 1024).await.unwrap();
        assert!(intercepted.body.is_none());
    }
}
