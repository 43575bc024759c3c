// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation window extraction for Patchbay route classification.
//!
//! The classifier prompt embeds a slice of the conversation. This crate
//! selects that slice: newest messages first, bounded by a heuristic cost
//! budget, re-ordered chronologically before rendering. Cost estimation is
//! pluggable via [`CostEstimator`]; the default [`HeuristicEstimator`]
//! divides content length by a fixed divisor so no tokenizer dependency is
//! needed on the interception path.

pub mod estimator;
pub mod window;

pub use estimator::{CostEstimator, HeuristicEstimator};
pub use window::{extract, WindowExtractor};
