// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat body wire types for the monitored conversational endpoint.
//!
//! The intercepted body is parsed only far enough to read the message list
//! and rewrite the `model` field; every other field rides through a flatten
//! map and reserializes unchanged.

use patchbay_core::{ConversationMessage, PatchbayError, Role};
use serde::{Deserialize, Serialize};

/// One chat message as carried on the wire. `content` stays raw JSON since
/// callers send both plain strings and structured part arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub content: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The monitored endpoint's request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatRequestBody {
    /// Parses intercepted bytes. Anything that is not a chat payload with
    /// `model` and `messages` comes back as
    /// [`PatchbayError::MalformedBody`].
    pub fn parse(bytes: &[u8]) -> Result<Self, PatchbayError> {
        serde_json::from_slice(bytes).map_err(|e| PatchbayError::MalformedBody(e.to_string()))
    }

    /// Reserializes for dispatch.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PatchbayError> {
        serde_json::to_vec(self).map_err(|e| {
            PatchbayError::Internal(format!("chat body reserialization failed: {e}"))
        })
    }

    /// The body's own message list as a conversation, used when no
    /// conversation collaborator yields anything. Messages without content
    /// are skipped; structured content is carried as its JSON text.
    pub fn conversation(&self) -> Vec<ConversationMessage> {
        self.messages
            .iter()
            .filter(|message| !message.content.is_null())
            .map(|message| ConversationMessage {
                role: Role::parse(&message.role),
                content: match message.content.as_str() {
                    Some(text) => text.to_string(),
                    None => message.content.to_string(),
                },
            })
            .collect()
    }
}
