// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost estimation for conversation messages.
//!
//! The window extractor charges each message an approximate unit cost plus a
//! one-time cost for the instruction template. The estimate only needs to be
//! proportional to real token counts, not exact, so the default implementation
//! is a character-count heuristic rather than a tokenizer.

use patchbay_config::model::ConversationConfig;
use patchbay_core::ConversationMessage;

/// Estimates the context cost of messages in fixed heuristic units.
///
/// Implementations must be deterministic: the same message always estimates
/// to the same cost.
pub trait CostEstimator: Send + Sync {
    /// Cost of including one message in the window.
    fn message_cost(&self, message: &ConversationMessage) -> u32;

    /// One-time cost of the instruction template, charged before any message.
    fn template_cost(&self) -> u32;
}

/// Character-count heuristic: content length divided by a fixed divisor.
///
/// A divisor of 4 approximates tokens for English prose, which is accurate
/// enough to keep the classification prompt inside the model's context.
#[derive(Debug, Clone)]
pub struct HeuristicEstimator {
    divisor: u32,
    template_cost: u32,
}

impl HeuristicEstimator {
    pub fn new(divisor: u32, template_cost: u32) -> Self {
        // config validation rejects a zero divisor; direct callers get a clamp
        Self {
            divisor: divisor.max(1),
            template_cost,
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(config.cost_divisor, config.template_cost)
    }
}

impl CostEstimator for HeuristicEstimator {
    fn message_cost(&self, message: &ConversationMessage) -> u32 {
        (message.content.len() / self.divisor as usize) as u32
    }

    fn template_cost(&self) -> u32 {
        self.template_cost
    }
}
