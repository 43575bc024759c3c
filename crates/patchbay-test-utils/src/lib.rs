// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Patchbay integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockClassifier`] - Mock classifier with pre-configured verdict replies
//! - [`MemoryPreferenceStore`] - In-memory preference store with merge semantics
//! - [`MockConversationSource`] - Mock conversation source with a fixed transcript
//! - [`RelayHarness`] - Full relay stack wired to a wiremock upstream

pub mod harness;
pub mod memory_store;
pub mod mock_classifier;
pub mod mock_conversation;

pub use harness::RelayHarness;
pub use memory_store::MemoryPreferenceStore;
pub use mock_classifier::MockClassifier;
pub use mock_conversation::MockConversationSource;
