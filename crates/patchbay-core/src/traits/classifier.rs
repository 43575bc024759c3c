// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier trait: the external inference service that maps a
//! classification prompt to a route verdict.

use async_trait::async_trait;

use crate::error::PatchbayError;
use crate::traits::adapter::CollaboratorAdapter;

/// Issues one classification call to an inference service.
///
/// Implementations perform exactly one attempt per call: transport
/// failures and non-success statuses come back as
/// [`PatchbayError::ClassifierUnavailable`](crate::PatchbayError), never as
/// retries. The relay controller maps any error to the indeterminate
/// verdict.
#[async_trait]
pub trait ClassifierAdapter: CollaboratorAdapter {
    /// Sends the prompt and returns the raw classifier text.
    async fn classify(&self, prompt: &str) -> Result<String, PatchbayError>;
}
