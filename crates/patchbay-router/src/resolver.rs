// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure resolution from classifier verdicts to target models.
//!
//! No I/O and no side effects here: given the same verdict and the same
//! snapshot, resolution always produces the same answer.

use patchbay_core::{RoutePreference, RoutingSnapshot};
use strum::Display;

/// Route name the classifier answers when no catalog route applies.
pub const OTHER_ROUTE: &str = "other";

/// Resolves a route name to a target model.
///
/// Exact, case-sensitive name match against the catalog; the first match
/// wins (names are unique within a catalog). A missing verdict, the `other`
/// sentinel, or an unmatched name all fall back to `default_model`. When
/// that is also absent the result is `None` and the request body keeps its
/// original model.
pub fn resolve_model(
    route: Option<&str>,
    catalog: &[RoutePreference],
    default_model: Option<&str>,
) -> Option<String> {
    match route {
        Some(name) if name != OTHER_ROUTE => catalog
            .iter()
            .find(|preference| preference.name == name)
            .map(|preference| preference.target_model.clone())
            .or_else(|| default_model.map(str::to_string)),
        _ => default_model.map(str::to_string),
    }
}

/// Why a decision picked (or declined to pick) a model. Logged per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DecisionReason {
    /// Routing is switched off; the default model is applied unconditionally.
    RoutingDisabled,
    /// The verdict matched a catalog route.
    CatalogMatch,
    /// The verdict was `other` or unmatched; fell back to the default model.
    DefaultModel,
    /// The classifier produced no usable verdict.
    Indeterminate,
    /// A fallback was needed but no default model is configured.
    Unconfigured,
}

/// Outcome of routing one intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    /// The parsed verdict, if any.
    pub route: Option<String>,
    /// Model to write into the dispatched body; `None` leaves it untouched.
    pub model: Option<String>,
    /// Why this model was chosen.
    pub reason: DecisionReason,
}

impl RouteDecision {
    /// Decision taken without classification when routing is disabled:
    /// every intercepted request gets the default model.
    pub fn disabled(snapshot: &RoutingSnapshot) -> Self {
        Self {
            route: None,
            model: snapshot.default_model.clone(),
            reason: DecisionReason::RoutingDisabled,
        }
    }
}

/// Turns a parsed verdict into a [`RouteDecision`] against one snapshot.
pub fn decide(verdict: Option<&str>, snapshot: &RoutingSnapshot) -> RouteDecision {
    let model = resolve_model(verdict, &snapshot.catalog, snapshot.default_model.as_deref());

    let matched = verdict
        .filter(|name| *name != OTHER_ROUTE)
        .is_some_and(|name| snapshot.catalog.iter().any(|p| p.name == name));

    let reason = if matched {
        DecisionReason::CatalogMatch
    } else if verdict.is_none() {
        DecisionReason::Indeterminate
    } else if model.is_some() {
        DecisionReason::DefaultModel
    } else {
        DecisionReason::Unconfigured
    };

    RouteDecision {
        route: verdict.map(str::to_string),
        model,
        reason,
    }
}
