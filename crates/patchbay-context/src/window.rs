// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Budgeted conversation window extraction.
//!
//! Walks a conversation from newest to oldest, retaining messages while the
//! accumulated cost estimate stays inside the budget, then restores
//! chronological order. The newest message is always retained so every
//! non-empty conversation produces a non-empty window.

use patchbay_config::model::ConversationConfig;
use patchbay_core::{ConversationMessage, Role};
use tracing::debug;

use crate::estimator::{CostEstimator, HeuristicEstimator};

/// Extract a budgeted, chronologically ordered window from `messages`.
///
/// The template cost is charged once up front. Messages are then admitted
/// newest first until one no longer fits. Two exceptions to the budget:
/// - the newest message is always retained, so the window is non-empty
///   whenever the input is;
/// - if the cutoff dropped every user message, the most recent user message
///   is pulled back in so the intent being routed stays visible.
pub fn extract(
    messages: &[ConversationMessage],
    budget: u32,
    estimator: &dyn CostEstimator,
) -> Vec<ConversationMessage> {
    if messages.is_empty() {
        return Vec::new();
    }

    let mut remaining = budget.saturating_sub(estimator.template_cost());
    let mut retained: Vec<usize> = Vec::new();

    for idx in (0..messages.len()).rev() {
        let cost = estimator.message_cost(&messages[idx]);
        if retained.is_empty() {
            retained.push(idx);
            remaining = remaining.saturating_sub(cost);
            continue;
        }
        if cost > remaining {
            break;
        }
        retained.push(idx);
        remaining -= cost;
    }

    let has_user = retained.iter().any(|&i| messages[i].role == Role::User);
    if !has_user {
        if let Some(user_idx) = messages.iter().rposition(|m| m.role == Role::User) {
            retained.push(user_idx);
        }
    }

    retained.sort_unstable();
    retained.into_iter().map(|i| messages[i].clone()).collect()
}

/// Window extractor configured from `[conversation]` settings.
///
/// Thin wrapper over [`extract`] carrying the budget and the default
/// character-count estimator.
#[derive(Debug, Clone)]
pub struct WindowExtractor {
    budget: u32,
    estimator: HeuristicEstimator,
}

impl WindowExtractor {
    /// Creates a new extractor from conversation configuration.
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            budget: config.window_budget,
            estimator: HeuristicEstimator::from_config(config),
        }
    }

    /// Extracts the classification window for one conversation.
    pub fn window(&self, messages: &[ConversationMessage]) -> Vec<ConversationMessage> {
        let window = extract(messages, self.budget, &self.estimator);
        debug!(
            total = messages.len(),
            retained = window.len(),
            budget = self.budget,
            "extracted conversation window"
        );
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> ConversationMessage {
        ConversationMessage::new(Role::User, content)
    }

    fn assistant(content: &str) -> ConversationMessage {
        ConversationMessage::new(Role::Assistant, content)
    }

    /// Estimator charging one unit per message regardless of content.
    struct FlatEstimator {
        template: u32,
    }

    impl CostEstimator for FlatEstimator {
        fn message_cost(&self, _message: &ConversationMessage) -> u32 {
            1
        }

        fn template_cost(&self) -> u32 {
            self.template
        }
    }

    #[test]
    fn empty_input_yields_empty_window() {
        let estimator = HeuristicEstimator::new(4, 0);
        assert!(extract(&[], 100, &estimator).is_empty());
    }

    #[test]
    fn everything_fits_inside_budget() {
        let messages = vec![user("hello"), assistant("hi there"), user("help me")];
        let estimator = HeuristicEstimator::new(4, 0);
        let window = extract(&messages, 100, &estimator);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "hello");
        assert_eq!(window[2].content, "help me");
    }

    #[test]
    fn budget_drops_oldest_messages_first() {
        let messages = vec![
            user("aaaaaaaaaaaaaaaaaaaa"),
            assistant("bbbbbbbbbbbbbbbbbbbb"),
            user("cccccccccccccccccccc"),
        ];
        // Each message costs 5; budget 10 fits exactly the two newest.
        let estimator = HeuristicEstimator::new(4, 0);
        let window = extract(&messages, 10, &estimator);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "bbbbbbbbbbbbbbbbbbbb");
        assert_eq!(window[1].content, "cccccccccccccccccccc");
    }

    #[test]
    fn newest_message_survives_even_over_budget() {
        let messages = vec![user("aaaaaaaa"), user(&"x".repeat(400))];
        let estimator = HeuristicEstimator::new(4, 0);
        let window = extract(&messages, 10, &estimator);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content.len(), 400);
    }

    #[test]
    fn most_recent_user_message_is_pulled_back_in() {
        let messages = vec![
            user("please write a merge sort in rust for me"),
            assistant("ok"),
            assistant("done"),
        ];
        // Budget fits the two short assistant messages but not the user one.
        let estimator = HeuristicEstimator::new(1, 0);
        let window = extract(&messages, 10, &estimator);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[1].content, "ok");
        assert_eq!(window[2].content, "done");
    }

    #[test]
    fn template_cost_shrinks_capacity() {
        let messages = vec![user("aaaa"), user("bbbb"), user("cccc")];
        // Each message costs 1 after division; template eats all but one unit.
        let estimator = HeuristicEstimator::new(4, 9);
        let window = extract(&messages, 10, &estimator);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].content, "cccc");
    }

    #[test]
    fn window_is_chronological() {
        let messages: Vec<_> = (0..6)
            .map(|i| {
                if i % 2 == 0 {
                    user(&format!("question {i}"))
                } else {
                    assistant(&format!("answer {i}"))
                }
            })
            .collect();
        let estimator = FlatEstimator { template: 0 };
        let window = extract(&messages, 4, &estimator);
        assert_eq!(window.len(), 4);
        for pair in window.windows(2) {
            let a: usize = pair[0].content.split(' ').last().unwrap().parse().unwrap();
            let b: usize = pair[1].content.split(' ').last().unwrap().parse().unwrap();
            assert!(a < b, "window out of chronological order");
        }
    }

    #[test]
    fn custom_estimator_controls_admission() {
        let messages = vec![user("a"), user("b"), user("c"), user("d")];
        let estimator = FlatEstimator { template: 0 };
        let window = extract(&messages, 2, &estimator);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "c");
        assert_eq!(window[1].content, "d");
    }

    #[test]
    fn extractor_wraps_config() {
        let config = patchbay_config::model::ConversationConfig {
            window_budget: 10,
            cost_divisor: 4,
            template_cost: 0,
        };
        let extractor = WindowExtractor::new(&config);
        let messages = vec![user("aaaaaaaaaaaaaaaaaaaa"), user("bbbbbbbbbbbbbbbbbbbb")];
        let window = extractor.window(&messages);
        assert_eq!(window.len(), 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_message() -> impl Strategy<Value = ConversationMessage> {
            (prop_oneof![Just(Role::User), Just(Role::Assistant), Just(Role::Other)], ".{0,120}")
                .prop_map(|(role, content)| ConversationMessage::new(role, content))
        }

        proptest! {
            #[test]
            fn window_is_nonempty_for_nonempty_input(
                messages in prop::collection::vec(arb_message(), 1..40),
                budget in 0u32..2000,
            ) {
                let estimator = HeuristicEstimator::new(4, 16);
                let window = extract(&messages, budget, &estimator);
                prop_assert!(!window.is_empty());
            }

            #[test]
            fn window_always_contains_newest_message(
                messages in prop::collection::vec(arb_message(), 1..40),
                budget in 0u32..2000,
            ) {
                let estimator = HeuristicEstimator::new(4, 16);
                let window = extract(&messages, budget, &estimator);
                let newest = messages.last().unwrap();
                let last = window.last().unwrap();
                prop_assert_eq!(&last.content, &newest.content);
                prop_assert_eq!(last.role, newest.role);
            }

            #[test]
            fn window_is_a_subsequence_of_input(
                messages in prop::collection::vec(arb_message(), 1..40),
                budget in 0u32..2000,
            ) {
                let estimator = HeuristicEstimator::new(4, 16);
                let window = extract(&messages, budget, &estimator);
                let mut cursor = 0usize;
                for retained in &window {
                    let found = messages[cursor..].iter().position(|m| {
                        m.content == retained.content && m.role == retained.role
                    });
                    prop_assert!(found.is_some(), "retained message missing or reordered");
                    cursor += found.unwrap() + 1;
                }
            }

            #[test]
            fn window_keeps_most_recent_user_message(
                messages in prop::collection::vec(arb_message(), 1..40),
                budget in 0u32..2000,
            ) {
                let estimator = HeuristicEstimator::new(4, 16);
                let window = extract(&messages, budget, &estimator);
                if messages.iter().any(|m| m.role == Role::User) {
                    prop_assert!(window.iter().any(|m| m.role == Role::User));
                }
            }
        }
    }
}
