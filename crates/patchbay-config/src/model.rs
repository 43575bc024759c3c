// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Patchbay relay gateway.
//!
//! Every table is `#[serde(deny_unknown_fields)]` so a mistyped key fails
//! the load instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Patchbay configuration.
///
/// Merged from the TOML lookup chain and `PATCHBAY_` environment
/// variables. A missing section just means its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PatchbayConfig {
    /// Gateway listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream conversational origin settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Route classifier endpoint settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Conversation window extraction settings.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Preference store settings.
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Gateway listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9091
}

/// Upstream conversational origin configuration.
///
/// The gateway forwards every inbound request to this origin; requests whose
/// path equals `chat_path` are eligible for model rewriting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the upstream origin, scheme and authority only.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path of the monitored conversational endpoint.
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Connect timeout for upstream dispatch in seconds. No total timeout is
    /// applied so long-lived streamed responses are never cut off.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Maximum inbound request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            chat_path: default_chat_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_origin() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_chat_path() -> String {
    "/v1/chat/completions".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_body_bytes() -> usize {
    2_097_152 // 2 MiB
}

/// Route classifier endpoint configuration.
///
/// Sampling parameters default to near-deterministic decoding so the same
/// conversation classifies to the same route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Full URL of the local generate endpoint.
    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each classification request.
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling cutoff.
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Top-k sampling cutoff.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Total request timeout in seconds. The classifier reply is small and
    /// non-streamed, so a hard deadline is safe here.
    #[serde(default = "default_classifier_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: default_classifier_endpoint(),
            model: default_classifier_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            timeout_secs: default_classifier_timeout_secs(),
        }
    }
}

fn default_classifier_endpoint() -> String {
    "http://127.0.0.1:11434/api/generate".to_string()
}

fn default_classifier_model() -> String {
    "arch-router".to_string()
}

fn default_temperature() -> f64 {
    0.01
}

fn default_top_p() -> f64 {
    0.95
}

fn default_top_k() -> u32 {
    10
}

fn default_classifier_timeout_secs() -> u64 {
    30
}

/// Conversation window extraction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Context budget for the classification window, in heuristic units.
    #[serde(default = "default_window_budget")]
    pub window_budget: u32,

    /// Divisor applied to content length when estimating message cost.
    #[serde(default = "default_cost_divisor")]
    pub cost_divisor: u32,

    /// Fixed cost charged once for the instruction template.
    #[serde(default = "default_template_cost")]
    pub template_cost: u32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            window_budget: default_window_budget(),
            cost_divisor: default_cost_divisor(),
            template_cost: default_template_cost(),
        }
    }
}

fn default_window_budget() -> u32 {
    3072
}

fn default_cost_divisor() -> u32 {
    4
}

fn default_template_cost() -> u32 {
    256
}

/// Preference store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PreferencesConfig {
    /// Path to the JSON preference document.
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("patchbay").join("preferences.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("preferences.json"))
        .to_string_lossy()
        .into_owned()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Base level for the `patchbay` targets: trace, debug, info, warn,
    /// or error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
