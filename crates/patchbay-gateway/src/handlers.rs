// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP handlers for the admin surface.
//!
//! Handles GET/POST /patchbay/preferences and GET /patchbay/health. The
//! preference endpoints are the HTTP face of the settings collaborator:
//! reads return the full stored record, writes merge a partial record and
//! echo the merged result.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use patchbay_core::{PreferenceKey, PreferenceRecord};
use patchbay_relay::interceptor;

use crate::server::GatewayState;

/// Response body for GET /patchbay/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process answers at all.
    pub status: String,
    /// Version of the running gateway.
    pub version: String,
    /// Relay sessions currently in flight.
    pub in_flight: usize,
}

/// GET /patchbay/preferences
///
/// Returns the full preference record as stored.
pub async fn get_preferences(State(state): State<GatewayState>) -> Response {
    match state.preferences.get(&PreferenceKey::ALL).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => {
            warn!(error = %e, "preference read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /patchbay/preferences
///
/// Accepts a partial record, merges it into the store, and echoes the
/// merged record. Malformed JSON gets a plain-text 400.
pub async fn post_preferences(State(state): State<GatewayState>, body: Bytes) -> Response {
    let record: PreferenceRecord = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("invalid preference document: {e}"),
            )
                .into_response();
        }
    };

    if let Err(e) = state.preferences.set(record).await {
        warn!(error = %e, "preference write failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    match state.preferences.get(&PreferenceKey::ALL).await {
        Ok(merged) => Json(merged).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// GET /patchbay/health
///
/// Liveness plus the in-flight relay session count. Counts zero when no
/// interceptor is installed.
pub async fn get_health() -> Json<HealthResponse> {
    let in_flight = interceptor::current()
        .map(|interceptor| interceptor.in_flight())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        in_flight,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use patchbay_config::model::UpstreamConfig;
    use patchbay_relay::Upstream;
    use patchbay_test_utils::MemoryPreferenceStore;
    use tower::ServiceExt;

    use crate::server::{build_router, GatewayState};

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

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_liveness_and_in_flight_count() {
        let app = build_router(test_state("http://127.0.0.1:9"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/patchbay/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["in_flight"], 0);
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn preferences_merge_and_echo_through_the_admin_surface() {
        let app = build_router(test_state("http://127.0.0.1:9"));

        let first = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/patchbay/preferences")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"routingEnabled":true,"defaultModel":"llama3"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(first.status(), 200);

        // A later partial write merges instead of replacing.
        let second = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/patchbay/preferences")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"routingEnabled":false}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let echoed = body_json(second).await;
        assert_eq!(echoed["routingEnabled"], false);
        assert_eq!(echoed["defaultModel"], "llama3");

        let read = app
            .oneshot(
                Request::builder()
                    .uri("/patchbay/preferences")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let stored = body_json(read).await;
        assert_eq!(stored["defaultModel"], "llama3");
    }

    #[tokio::test]
    async fn malformed_preference_documents_get_a_plain_text_400() {
        let app = build_router(test_state("http://127.0.0.1:9"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/patchbay/preferences")
                    .body(Body::from("not a json document {"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        assert!(content_type.starts_with("text/plain"), "{content_type}");
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("invalid preference document"));
    }
}
