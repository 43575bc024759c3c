// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process shutdown.
//!
//! A background watcher turns SIGINT or SIGTERM into a cancelled
//! [`CancellationToken`]; the gateway listener stops accepting on it, and
//! open relay sessions get a bounded drain window before the process exits.

use std::time::Duration;

use patchbay_relay::Interceptor;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn the signal watcher and hand back the token it will cancel.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let watched = token.clone();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal, "shutdown requested");
        watched.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}

/// Wait up to `timeout` for open relay sessions to finish.
///
/// A session ends on its own once its upstream body runs dry, so this only
/// polls the interceptor registry until it empties or the window closes.
pub async fn drain_relays(interceptor: &Interceptor, timeout: Duration) {
    let open = interceptor.in_flight();
    if open == 0 {
        return;
    }

    info!(count = open, "draining open relay sessions");
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if interceptor.in_flight() == 0 {
            info!("relay sessions drained");
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    warn!(
        remaining = interceptor.in_flight(),
        "drain window closed with sessions still open"
    );
}
