// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that all collaborator adapters must implement.

use async_trait::async_trait;

use crate::error::PatchbayError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for Patchbay's external collaborators.
///
/// The relay core treats the preference store, the conversation source, and
/// the classifier as pluggable collaborators; each must implement this
/// trait, which provides identity, lifecycle, and health check capabilities.
#[async_trait]
pub trait CollaboratorAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this collaborator instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this collaborator.
    fn version(&self) -> semver::Version;

    /// Returns the kind of collaborator (preferences, conversation, classifier).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the collaborator's current status.
    async fn health_check(&self) -> Result<HealthStatus, PatchbayError>;

    /// Gracefully shuts down the collaborator, releasing any held resources.
    async fn shutdown(&self) -> Result<(), PatchbayError>;
}
