// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier verdict parsing.
//!
//! The classifier is expected to answer `{"route": "<name>"}` but small
//! models drift: single quotes, literal `\n` sequences, and markdown code
//! fences all show up in practice. Parsing tries the raw text first, then
//! exactly one repaired variant. Anything still unparseable is an
//! indeterminate verdict, never an error: the caller falls back to the
//! default model instead of failing the relay.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct RouteVerdict {
    route: Option<String>,
}

/// Parses classifier output into a route name.
///
/// Returns `None` (indeterminate) when the text is empty, unparseable after
/// one repair pass, or parses to an empty, null, or missing `route` field.
pub fn parse_route_verdict(content: &str) -> Option<String> {
    if content.is_empty() {
        return None;
    }

    let verdict = serde_json::from_str::<RouteVerdict>(content)
        .or_else(|_| serde_json::from_str::<RouteVerdict>(&repair_json(content)))
        .ok()?;

    let route = verdict.route.unwrap_or_default();
    if route.is_empty() {
        None
    } else {
        Some(route)
    }
}

/// One-shot cleanup of common small-model JSON drift: single quotes become
/// double quotes, literal `\n` sequences are stripped, and a surrounding
/// ```` ```json ```` fence is removed.
fn repair_json(content: &str) -> String {
    let mut repaired = content.replace('\'', "\"");

    if repaired.contains("\\n") {
        repaired = repaired.replace("\\n", "");
    }

    let trimmed = repaired.trim();
    if let Some(inner) = trimmed.strip_prefix("```json") {
        repaired = inner.trim_end_matches("```").to_string();
    } else if trimmed.starts_with("```") || trimmed.ends_with("```") {
        repaired = trimmed
            .trim_start_matches("```")
            .trim_end_matches("```")
            .to_string();
    }

    repaired
}
