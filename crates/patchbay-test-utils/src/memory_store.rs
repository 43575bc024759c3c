// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory preference store for deterministic testing.
//!
//! `MemoryPreferenceStore` implements `PreferenceAdapter` with the same
//! merge and select semantics as the file-backed store, without touching
//! the filesystem.

use async_trait::async_trait;
use tokio::sync::RwLock;

use patchbay_core::traits::adapter::CollaboratorAdapter;
use patchbay_core::traits::preferences::PreferenceAdapter;
use patchbay_core::types::{AdapterType, HealthStatus, PreferenceKey, PreferenceRecord};
use patchbay_core::PatchbayError;

/// An in-memory preference store.
///
/// `get` selects the requested keys from the held record; `set` merges
/// the present fields of the incoming record over it. The `failing()`
/// constructor produces a store whose every read and write errors, for
/// exercising the unreadable-store paths.
pub struct MemoryPreferenceStore {
    record: RwLock<PreferenceRecord>,
    available: bool,
}

impl MemoryPreferenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            record: RwLock::new(PreferenceRecord::default()),
            available: true,
        }
    }

    /// Create a store pre-loaded with the given record.
    pub fn with_record(record: PreferenceRecord) -> Self {
        Self {
            record: RwLock::new(record),
            available: true,
        }
    }

    /// Create a store whose every read and write fails.
    pub fn failing() -> Self {
        Self {
            record: RwLock::new(PreferenceRecord::default()),
            available: false,
        }
    }

    /// The full record currently held, for assertions.
    pub async fn record(&self) -> PreferenceRecord {
        self.record.read().await.clone()
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaboratorAdapter for MemoryPreferenceStore {
    fn name(&self) -> &str {
        "memory-preferences"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Preferences
    }

    async fn health_check(&self) -> Result<HealthStatus, PatchbayError> {
        if self.available {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("configured failing".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), PatchbayError> {
        Ok(())
    }
}

#[async_trait]
impl PreferenceAdapter for MemoryPreferenceStore {
    async fn get(&self, keys: &[PreferenceKey]) -> Result<PreferenceRecord, PatchbayError> {
        if !self.available {
            return Err(PatchbayError::Store {
                message: "memory store is configured failing".to_string(),
                source: None,
            });
        }
        Ok(self.record.read().await.select(keys))
    }

    async fn set(&self, record: PreferenceRecord) -> Result<(), PatchbayError> {
        if !self.available {
            return Err(PatchbayError::Store {
                message: "memory store is configured failing".to_string(),
                source: None,
            });
        }
        self.record.write().await.merge(record);
        Ok(())
    }
}
