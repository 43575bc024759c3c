// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interception and relay pipeline for the Patchbay proxy.
//!
//! The relay realm is split across an [`Interceptor`] that claims chat
//! completion requests at the network boundary and a [`RelayController`]
//! that decides, rewrites, and dispatches them:
//!
//! - [`interceptor`] matches requests against the monitored path and
//!   bridges matches to the controller
//! - [`bridge`] carries the request snapshot one way and response bytes
//!   the other, with no envelope or cancellation crossing
//! - [`controller`] snapshots preferences, classifies the conversation,
//!   rewrites the model field, and dispatches upstream
//! - [`session`] tracks each relay through its lifecycle states
//! - [`wire`] parses and re-serializes chat completion bodies
//! - [`upstream`] performs the single dispatch attempt

pub mod body;
pub mod bridge;
pub mod controller;
pub mod interceptor;
pub mod session;
pub mod upstream;
pub mod wire;

pub use body::{RelayResponse, RelayedBody};
pub use bridge::{open, ControllerEnd, InterceptorEnd, RelayCommand, RelayEvent, BRIDGE_CAPACITY};
pub use controller::RelayController;
pub use interceptor::Interceptor;
pub use session::{RelaySession, RelayState};
pub use upstream::Upstream;
pub use wire::{ChatMessage, ChatRequestBody};
