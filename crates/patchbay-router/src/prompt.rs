// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification prompt rendering.
//!
//! The prompt embeds the route catalog inside `<routes>` tags as YAML-style
//! name/description pairs and the conversation window inside `<conversation>`
//! tags as one `role: "content"` line per message. Content is JSON-quoted so
//! embedded newlines and quotes never break the line structure.

use patchbay_core::{ConversationMessage, Role, RoutePreference};

/// Template for the route classification prompt. `{routes}` and
/// `{conversation}` are substituted at render time.
pub const ROUTE_PROMPT_TEMPLATE: &str = r#"
You are a helpful assistant designed to find the best suited route.
You are provided with route descriptions within <routes></routes> XML tags:
<routes>
{routes}
</routes>

Your task is to decide which route best matches the latest user intent in the conversation within <conversation></conversation> XML tags. Follow these instructions:
1. If the latest user intent is unrelated to every route, respond with {"route": "other"}.
2. If the user request has already been satisfied and the user is thanking or ending the conversation, respond with {"route": "other"}.
3. Otherwise, understand the latest user intent and find the best matching route in the <routes></routes> XML tags.

Based on your analysis, provide your response in the following JSON format:
{"route": "route_name"}


<conversation>
{conversation}
</conversation>
"#;

/// Renders the catalog as YAML-style list entries, one route per entry.
pub fn render_routes(catalog: &[RoutePreference]) -> String {
    catalog
        .iter()
        .map(|route| format!("- name: {}\n  description: {}", route.name, route.usage))
        .collect::<Vec<String>>()
        .join("\n")
}

/// Renders the conversation window as `role: "content"` lines.
///
/// Messages with [`Role::Other`] (system prompts, tool output) are omitted:
/// they carry no routable intent and would only dilute the window.
pub fn render_conversation(window: &[ConversationMessage]) -> String {
    window
        .iter()
        .filter(|message| message.role != Role::Other)
        .map(|message| {
            let content = serde_json::to_string(&message.content).unwrap_or_default();
            format!("{}: {}", message.role, content)
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Renders the full classification prompt for one intercepted request.
pub fn render_route_prompt(catalog: &[RoutePreference], window: &[ConversationMessage]) -> String {
    ROUTE_PROMPT_TEMPLATE
        .replace("{routes}", &render_routes(catalog))
        .replace("{conversation}", &render_conversation(window))
}
