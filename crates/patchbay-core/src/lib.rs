// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core vocabulary of the Patchbay relay.
//!
//! Defines the collaborator traits, the error type, and the shared data
//! types the rest of the workspace is written against. Adapter crates
//! depend on this one and implement the traits; nothing here performs IO.

pub mod error;
pub mod traits;
pub mod types;

pub use error::PatchbayError;
pub use types::{
    AdapterType, ConversationMessage, CredentialsMode, HealthStatus, InterceptedRequest,
    PreferenceKey, PreferenceRecord, Role, RouteCatalog, RoutePreference, RoutingSnapshot,
};

pub use traits::{
    ClassifierAdapter, CollaboratorAdapter, ConversationAdapter, PreferenceAdapter,
};
