// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Patchbay relay.
//!
//! Every collaborator builds on the [`CollaboratorAdapter`] base trait;
//! the traits are `#[async_trait]` so the relay can hold them as trait
//! objects.

pub mod adapter;
pub mod classifier;
pub mod conversation;
pub mod preferences;

pub use adapter::CollaboratorAdapter;
pub use classifier::ClassifierAdapter;
pub use conversation::ConversationAdapter;
pub use preferences::PreferenceAdapter;
