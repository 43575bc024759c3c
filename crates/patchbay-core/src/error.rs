// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Patchbay relay.

use thiserror::Error;

/// The primary error type used across all Patchbay collaborator traits and
/// relay operations.
///
/// Every error is session-local: a failing relay session degrades or closes
/// itself without affecting other in-flight sessions, and nothing here
/// propagates past the relay controller's `handle` boundary.
#[derive(Debug, Error)]
pub enum PatchbayError {
    /// The loaded configuration cannot back a running relay.
    #[error("unusable configuration: {0}")]
    Config(String),

    /// Preference store errors (unreadable file, corrupt document, write failure).
    #[error("preference store error: {message}")]
    Store {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An intercepted or classifier payload could not be parsed.
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// The classifier endpoint could not be reached or answered non-success.
    #[error("classifier unavailable: {message}")]
    ClassifierUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The single upstream dispatch attempt failed.
    #[error("upstream dispatch failed: {message}")]
    UpstreamDispatch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A bridge endpoint was closed before the session finished with it.
    #[error("bridge error: {0}")]
    Bridge(String),

    /// A second interceptor install was attempted while one is registered.
    #[error("interceptor already installed")]
    AlreadyInstalled,

    /// Collaborator health check failed.
    #[error("{name} failed its health check: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Anything that has no business happening.
    #[error("internal fault: {0}")]
    Internal(String),
}
