// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide interception of outbound conversational calls.
//!
//! The interceptor wraps the upstream dispatcher. `OPTIONS` requests and
//! unmatched paths pass through untouched; a request to the monitored
//! endpoint is handed to a freshly spawned controller task over a bridge,
//! and the returned response body is fed by that bridge.
//!
//! A process-scoped slot holds at most one installed interceptor: `install`
//! fails while one is registered, `uninstall` exists for test isolation,
//! and `current` is the lock-free per-request accessor.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use patchbay_core::{InterceptedRequest, PatchbayError};
use tracing::{info, trace};

use crate::body::RelayResponse;
use crate::bridge;
use crate::controller::RelayController;

static CURRENT: ArcSwapOption<Interceptor> = ArcSwapOption::const_empty();
static INSTALL: Mutex<()> = Mutex::new(());

/// Intercepts outbound calls, relaying the monitored endpoint through the
/// controller realm and passing everything else through.
pub struct Interceptor {
    monitored_path: String,
    controller: Arc<RelayController>,
}

impl Interceptor {
    pub fn new(monitored_path: impl Into<String>, controller: Arc<RelayController>) -> Self {
        Self {
            monitored_path: monitored_path.into(),
            controller,
        }
    }

    pub fn monitored_path(&self) -> &str {
        &self.monitored_path
    }

    /// Sessions currently in flight through the controller realm.
    pub fn in_flight(&self) -> usize {
        self.controller.in_flight()
    }

    /// Entry point for every outbound call.
    ///
    /// Preflight semantics are never altered: `OPTIONS` passes through
    /// unconditionally, before the path is even looked at.
    pub async fn handle(&self, request: InterceptedRequest) -> Result<RelayResponse, PatchbayError> {
        if request.is_options() {
            trace!(path = request.path(), "preflight passthrough");
            return self.controller.upstream().forward(&request).await;
        }
        if request.path() != self.monitored_path {
            trace!(path = request.path(), "unmatched path passthrough");
            return self.controller.upstream().forward(&request).await;
        }

        let (interceptor_end, controller_end) = bridge::open();
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move { controller.run(controller_end).await });

        interceptor_end.fetch(request).await?;
        Ok(RelayResponse::streamed(interceptor_end.into_body()))
    }
}

/// Registers `interceptor` as the process-wide instance. Fails with
/// [`PatchbayError::AlreadyInstalled`] while one is registered.
pub fn install(interceptor: Interceptor) -> Result<(), PatchbayError> {
    let _guard = INSTALL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if CURRENT.load().is_some() {
        return Err(PatchbayError::AlreadyInstalled);
    }
    CURRENT.store(Some(Arc::new(interceptor)));
    info!("interceptor installed");
    Ok(())
}

/// Clears the process-wide slot, returning the interceptor if one was
/// registered. In-flight sessions keep their controller alive through
/// their own `Arc`.
pub fn uninstall() -> Option<Arc<Interceptor>> {
    let _guard = INSTALL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous = CURRENT.swap(None);
    if previous.is_some() {
        info!("interceptor uninstalled");
    }
    previous
}

/// The installed interceptor, if any. Lock-free; consulted per request.
pub fn current() -> Option<Arc<Interceptor>> {
    CURRENT.load_full()
}
