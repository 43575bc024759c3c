// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed preference store for Patchbay.
//!
//! Preferences live in one JSON document. Reads go to disk on every call,
//! which is what makes a per-request routing snapshot a true snapshot:
//! whatever the settings surface wrote last is what the next intercepted
//! request sees. Writes merge under a lock and persist atomically via a
//! temp file and rename, so concurrent readers observe either the old or
//! the new document, never a partial one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patchbay_config::model::PreferencesConfig;
use patchbay_core::{
    AdapterType, CollaboratorAdapter, HealthStatus, PatchbayError, PreferenceAdapter,
    PreferenceKey, PreferenceRecord,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The on-disk document: the preference record plus a write timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PreferenceDocument {
    #[serde(flatten)]
    record: PreferenceRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON-file implementation of [`PreferenceAdapter`].
pub struct FilePreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Creates a store from `[preferences]` configuration.
    pub fn new(config: &PreferencesConfig) -> Self {
        Self::at_path(&config.path)
    }

    /// Creates a store rooted at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepares the store for use: ensures the parent directory exists so
    /// the first `set` can rename its temp file into place. The document
    /// itself is created lazily; a missing file reads as an empty record.
    pub async fn initialize(&self) -> Result<(), PatchbayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PatchbayError::Store {
                        message: format!("failed to create {}: {e}", parent.display()),
                        source: Some(Box::new(e)),
                    })?;
            }
        }
        debug!(path = %self.path.display(), "preference store initialized");
        Ok(())
    }

    async fn read_document(&self) -> Result<PreferenceDocument, PatchbayError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(PreferenceDocument::default());
            }
            Err(e) => {
                return Err(PatchbayError::Store {
                    message: format!("failed to read {}: {e}", self.path.display()),
                    source: Some(Box::new(e)),
                });
            }
        };

        serde_json::from_str(&raw).map_err(|e| PatchbayError::Store {
            message: format!("corrupt preference document {}: {e}", self.path.display()),
            source: Some(Box::new(e)),
        })
    }

    async fn write_document(&self, document: &PreferenceDocument) -> Result<(), PatchbayError> {
        let json =
            serde_json::to_string_pretty(document).map_err(|e| PatchbayError::Store {
                message: format!("failed to serialize preference document: {e}"),
                source: Some(Box::new(e)),
            })?;

        // Write to a sibling temp file, then rename over the document so a
        // crash mid-write never leaves a truncated file behind.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| PatchbayError::Store {
                message: format!("failed to write {}: {e}", tmp.display()),
                source: Some(Box::new(e)),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PatchbayError::Store {
                message: format!("failed to replace {}: {e}", self.path.display()),
                source: Some(Box::new(e)),
            })
    }
}

#[async_trait]
impl CollaboratorAdapter for FilePreferenceStore {
    fn name(&self) -> &str {
        "file-preferences"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Preferences
    }

    async fn health_check(&self) -> Result<HealthStatus, PatchbayError> {
        match self.read_document().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => {
                warn!(error = %e, "preference document unreadable");
                Ok(HealthStatus::Unhealthy(format!("document unreadable: {e}")))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), PatchbayError> {
        debug!("preference store shutting down");
        Ok(())
    }
}

#[async_trait]
impl PreferenceAdapter for FilePreferenceStore {
    async fn get(&self, keys: &[PreferenceKey]) -> Result<PreferenceRecord, PatchbayError> {
        let document = self.read_document().await?;
        Ok(document.record.select(keys))
    }

    async fn set(&self, record: PreferenceRecord) -> Result<(), PatchbayError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        document.record.merge(record);
        document.updated_at = Some(Utc::now());
        self.write_document(&document).await?;

        debug!(path = %self.path.display(), "preferences persisted");
        Ok(())
    }
}
