// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Ollama generate endpoint.

use serde::{Deserialize, Serialize};

/// Request body for one classification call.
///
/// Sampling parameters ride at the top level and `stream` is always false:
/// the verdict is a single short JSON object, not a token stream.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub stream: bool,
}

/// Response body from the generate endpoint. Unknown fields (timings, token
/// counts, done markers) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}
