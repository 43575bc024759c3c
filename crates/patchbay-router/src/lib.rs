// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route classification plumbing for Patchbay.
//!
//! Three pure pieces used by the relay controller:
//! - [`prompt`]: renders the catalog and conversation window into the
//!   classification prompt,
//! - [`verdict`]: parses classifier output with one repair pass,
//! - [`resolver`]: maps a verdict to a target model with default fallback.
//!
//! Nothing in this crate performs I/O; the classifier HTTP call lives in
//! `patchbay-ollama` and orchestration in `patchbay-relay`.

pub mod prompt;
pub mod resolver;
pub mod verdict;

pub use prompt::{render_route_prompt, ROUTE_PROMPT_TEMPLATE};
pub use resolver::{decide, resolve_model, DecisionReason, RouteDecision, OTHER_ROUTE};
pub use verdict::parse_route_verdict;
