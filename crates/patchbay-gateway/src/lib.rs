// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway fronting the upstream origin.
//!
//! The gateway is the network boundary of the proxy: every inbound request
//! is materialized into an `InterceptedRequest` and offered to the
//! installed interceptor, which relays chat completion calls through the
//! controller and passes everything else through. When no interceptor is
//! installed the gateway forwards verbatim.
//!
//! A small admin surface under `/patchbay/` exposes the preference store
//! and a health endpoint; every other path falls through to the relay
//! handler.

pub mod handlers;
pub mod relay;
pub mod server;

pub use server::{build_router, run_server, GatewayState, ServerConfig};
