// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock conversation source for deterministic testing.
//!
//! `MockConversationSource` implements `ConversationAdapter` with an
//! injectable transcript, so tests control exactly what the relay sees
//! when it scrapes the surrounding conversation.

use async_trait::async_trait;
use tokio::sync::RwLock;

use patchbay_core::traits::adapter::CollaboratorAdapter;
use patchbay_core::traits::conversation::ConversationAdapter;
use patchbay_core::types::{AdapterType, ConversationMessage, HealthStatus};
use patchbay_core::PatchbayError;

/// A mock conversation source returning a pre-configured transcript.
pub struct MockConversationSource {
    messages: RwLock<Vec<ConversationMessage>>,
    available: bool,
}

impl MockConversationSource {
    /// Create a source with an empty transcript.
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            available: true,
        }
    }

    /// Create a source pre-loaded with the given transcript.
    pub fn with_messages(messages: Vec<ConversationMessage>) -> Self {
        Self {
            messages: RwLock::new(messages),
            available: true,
        }
    }

    /// Create a source whose every scrape fails.
    pub fn failing() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            available: false,
        }
    }

    /// Replace the transcript.
    pub async fn set_messages(&self, messages: Vec<ConversationMessage>) {
        *self.messages.write().await = messages;
    }
}

impl Default for MockConversationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CollaboratorAdapter for MockConversationSource {
    fn name(&self) -> &str {
        "mock-conversation"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Conversation
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
impl ConversationAdapter for MockConversationSource {
    async fn scrape(&self) -> Result<Vec<ConversationMessage>, PatchbayError> {
        if !self.available {
            return Err(PatchbayError::Internal(
                "mock conversation source is configured failing".to_string(),
            ));
        }
        Ok(self.messages.read().await.clone())
    }
}
