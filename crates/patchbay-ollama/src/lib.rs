// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama classifier adapter for Patchbay.
//!
//! Implements [`patchbay_core::ClassifierAdapter`] against a local
//! Ollama-compatible `/api/generate` endpoint: one non-streamed POST per
//! intercepted request, no retries.

pub mod client;
pub mod types;

pub use client::OllamaClassifier;
pub use types::{GenerateRequest, GenerateResponse};
