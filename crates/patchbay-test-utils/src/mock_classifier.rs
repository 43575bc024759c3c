// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classifier adapter for deterministic testing.
//!
//! `MockClassifier` implements `ClassifierAdapter` with pre-configured
//! verdict replies, enabling fast, CI-runnable tests without a live
//! inference service.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use patchbay_core::traits::adapter::CollaboratorAdapter;
use patchbay_core::traits::classifier::ClassifierAdapter;
use patchbay_core::types::{AdapterType, HealthStatus};
use patchbay_core::PatchbayError;

/// A mock classifier that returns pre-configured verdict replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a
/// default `{"route": "other"}` reply is returned. Every prompt passed
/// to `classify()` is captured and retrievable via `prompts()`.
pub struct MockClassifier {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    available: bool,
}

impl MockClassifier {
    /// Create a new mock classifier with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            available: true,
        }
    }

    /// Create a mock classifier pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            prompts: Arc::new(Mutex::new(Vec::new())),
            available: true,
        }
    }

    /// Create a mock classifier whose every call fails as unavailable.
    ///
    /// Prompts are still captured, so tests can assert that a call was
    /// attempted before the failure.
    pub fn unavailable() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            available: false,
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, text: String) {
        self.replies.lock().await.push_back(text);
    }

    /// All prompts captured so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    /// Pop the next reply, or return the default.
    async fn next_reply(&self) -> String {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| r#"{"route": "other"}"#.to_string())
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaboratorAdapter for MockClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, PatchbayError> {
        if self.available {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(
                "configured unavailable".to_string(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), PatchbayError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierAdapter for MockClassifier {
    async fn classify(&self, prompt: &str) -> Result<String, PatchbayError> {
        self.prompts.lock().await.push(prompt.to_string());
        if !self.available {
            return Err(PatchbayError::ClassifierUnavailable {
                message: "mock classifier is configured unavailable".to_string(),
                source: None,
            });
        }
        Ok(self.next_reply().await)
    }
}
