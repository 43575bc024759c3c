// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `patchbay serve` command implementation.
//!
//! Constructs the collaborator adapters (file-backed preference store and
//! Ollama classifier), installs the relay interceptor, and runs the gateway
//! until a shutdown signal arrives. On shutdown the interceptor is
//! uninstalled and in-flight relay sessions are drained.

use std::sync::Arc;
use std::time::Duration;

use patchbay_config::model::PatchbayConfig;
use patchbay_context::WindowExtractor;
use patchbay_core::{ClassifierAdapter, PatchbayError, PreferenceAdapter, PreferenceKey};
use patchbay_gateway::{run_server, GatewayState, ServerConfig};
use patchbay_ollama::OllamaClassifier;
use patchbay_relay::{interceptor, Interceptor, RelayController, Upstream};
use patchbay_store::FilePreferenceStore;
use tracing::{debug, info, warn};

use crate::shutdown;

/// How long shutdown waits for in-flight relay sessions to finish.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the `patchbay serve` command.
///
/// Builds the relay pipeline from configuration, registers it as the
/// process-wide interceptor, and serves the gateway. Returns once the
/// signal handler cancels and the listener has closed.
pub async fn run_serve(config: PatchbayConfig) -> Result<(), PatchbayError> {
    init_tracing(&config.log.level);

    info!("starting patchbay serve");

    // Preference store backing both routing snapshots and the admin surface.
    let preferences = Arc::new(FilePreferenceStore::new(&config.preferences));
    info!(path = config.preferences.path.as_str(), "preference store opened");

    // Route classifier.
    let classifier = Arc::new(OllamaClassifier::from_config(&config.classifier)?);
    info!(
        endpoint = config.classifier.endpoint.as_str(),
        model = config.classifier.model.as_str(),
        "classifier configured"
    );

    // Relay controller: classifies intercepted chat calls and dispatches
    // them upstream with the routed model. No conversation source is wired
    // here; classification windows come from the request body.
    let controller = Arc::new(RelayController::new(
        Arc::clone(&preferences) as Arc<dyn PreferenceAdapter>,
        None,
        Arc::clone(&classifier) as Arc<dyn ClassifierAdapter>,
        Upstream::from_config(&config.upstream)?,
        WindowExtractor::new(&config.conversation),
    ));
    debug!("no conversation source configured, classifying from request bodies");

    let monitored_path = config.upstream.chat_path.clone();
    interceptor::install(Interceptor::new(monitored_path.clone(), controller))?;
    info!(
        path = monitored_path.as_str(),
        origin = config.upstream.origin.as_str(),
        "relay interceptor installed"
    );

    report_routing_state(preferences.as_ref()).await;

    let state = GatewayState {
        preferences: Arc::clone(&preferences) as Arc<dyn PreferenceAdapter>,
        upstream: Arc::new(Upstream::from_config(&config.upstream)?),
        max_body_bytes: config.upstream.max_body_bytes,
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let cancel = shutdown::install_signal_handler();

    let served = run_server(&server_config, state, cancel).await;

    if let Some(installed) = interceptor::uninstall() {
        shutdown::drain_relays(installed.as_ref(), DRAIN_TIMEOUT).await;
    }

    info!("patchbay serve shutdown complete");
    served
}

/// Logs the routing state found in the preference document at startup.
async fn report_routing_state(preferences: &dyn PreferenceAdapter) {
    match preferences.get(&PreferenceKey::ALL).await {
        Ok(record) => {
            if record.routing_enabled.unwrap_or(false) {
                let routes = record.preferences.as_ref().map_or(0, Vec::len);
                info!(
                    routes,
                    default_model = record.default_model.as_deref().unwrap_or("<none>"),
                    "routing is on"
                );
            } else {
                info!("model routing disabled, calls relay with their original models");
            }
        }
        Err(e) => {
            warn!(error = %e, "preference document unreadable at startup");
        }
    }
}

/// Set up the tracing subscriber. `RUST_LOG` wins over the configured
/// level when present.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("patchbay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
