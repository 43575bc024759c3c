// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Axum server assembly for the gateway.
//!
//! One router serves two kinds of traffic: the `/patchbay/` admin surface
//! and a fallback that relays everything else toward the upstream origin.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use patchbay_core::{PatchbayError, PreferenceAdapter};
use patchbay_relay::Upstream;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::relay;

/// State every gateway handler runs against.
#[derive(Clone)]
pub struct GatewayState {
    /// Store behind the admin preference endpoints.
    pub preferences: Arc<dyn PreferenceAdapter>,
    /// Dispatcher for verbatim forwarding when no interceptor is installed.
    pub upstream: Arc<Upstream>,
    /// Cap on materialized inbound request bodies.
    pub max_body_bytes: usize,
}

/// Listen address for the gateway process. Kept separate from the config
/// crate so embedders can construct it directly.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Build the gateway router.
///
/// The admin surface under `/patchbay/` carries a permissive CORS layer so
/// browser settings pages can call it; relayed traffic is deliberately left
/// outside that layer, since OPTIONS preflights on monitored paths must
/// reach the real upstream.
pub fn build_router(state: GatewayState) -> Router {
    let admin = Router::new()
        .route(
            "/patchbay/preferences",
            get(handlers::get_preferences).post(handlers::post_preferences),
        )
        .route("/patchbay/health", get(handlers::get_health))
        .layer(CorsLayer::permissive());

    Router::new()
        .merge(admin)
        .fallback(relay::relay_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway server and serve until the token is cancelled.
pub async fn run_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), PatchbayError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PatchbayError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    match listener.local_addr() {
        Ok(bound) => tracing::info!("gateway listening on {bound}"),
        Err(_) => tracing::info!("gateway listening on {addr}"),
    }

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| PatchbayError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
