// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Preference store trait: the async key-value collaborator holding the
//! user's routing configuration.

use async_trait::async_trait;

use crate::error::PatchbayError;
use crate::traits::adapter::CollaboratorAdapter;
use crate::types::{PreferenceKey, PreferenceRecord};

/// Async key-value access to the user's routing preferences.
///
/// `get` returns a partial record containing only the requested keys that
/// are present in the store; `set` merges the present fields of the given
/// record over the stored document. The relay core only ever reads; the
/// settings collaborator writes through the same interface.
#[async_trait]
pub trait PreferenceAdapter: CollaboratorAdapter {
    /// Reads the requested keys, omitting any that are not stored.
    async fn get(&self, keys: &[PreferenceKey]) -> Result<PreferenceRecord, PatchbayError>;

    /// Merges the present fields of `record` into the store.
    async fn set(&self, record: PreferenceRecord) -> Result<(), PatchbayError>;
}
