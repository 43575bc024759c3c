// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation source trait: the collaborator that can observe the full
//! conversation the intercepted request belongs to.

use async_trait::async_trait;

use crate::error::PatchbayError;
use crate::traits::adapter::CollaboratorAdapter;
use crate::types::ConversationMessage;

/// Observes the conversation surrounding an intercepted request.
///
/// May return an empty list, in which case the relay controller falls back
/// to the message list inside the intercepted request body. Each relay
/// session scrapes exactly once at session start, so concurrent sessions
/// never observe a mid-session change.
#[async_trait]
pub trait ConversationAdapter: CollaboratorAdapter {
    /// Returns the conversation in chronological order; may be empty.
    async fn scrape(&self) -> Result<Vec<ConversationMessage>, PatchbayError>;
}
