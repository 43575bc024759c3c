// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks on a parsed configuration.
//!
//! Everything serde cannot express through types lands here: URL schemes,
//! sampling parameter ranges, and the relationship between the window
//! budget and the template cost.

use crate::diagnostic::ConfigError;
use crate::model::PatchbayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check a deserialized configuration for semantic problems.
///
/// Every check runs regardless of earlier failures, so the returned
/// `Err` carries all problems found in one pass.
pub fn validate_config(config: &PatchbayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else if !plausible_host(host) {
        errors.push(ConfigError::Validation {
            message: format!("server.host `{host}` is not a valid IP address or hostname"),
        });
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    // Validate upstream origin carries an HTTP scheme and no trailing slash
    let origin = config.upstream.origin.trim();
    if !origin.starts_with("http://") && !origin.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("upstream.origin `{origin}` must start with http:// or https://"),
        });
    }
    if origin.ends_with('/') {
        errors.push(ConfigError::Validation {
            message: format!("upstream.origin `{origin}` must not end with a slash"),
        });
    }

    if !config.upstream.chat_path.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "upstream.chat_path `{}` must start with `/`",
                config.upstream.chat_path
            ),
        });
    }

    if config.upstream.max_body_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "upstream.max_body_bytes must be greater than 0".to_string(),
        });
    }

    // Validate classifier endpoint and sampling parameters
    let endpoint = config.classifier.endpoint.trim();
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("classifier.endpoint `{endpoint}` must start with http:// or https://"),
        });
    }

    if config.classifier.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "classifier.model must not be empty".to_string(),
        });
    }

    if !(0.0..=2.0).contains(&config.classifier.temperature) {
        errors.push(ConfigError::Validation {
            message: format!(
                "classifier.temperature must be between 0.0 and 2.0, got {}",
                config.classifier.temperature
            ),
        });
    }

    if !(config.classifier.top_p > 0.0 && config.classifier.top_p <= 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "classifier.top_p must be in (0.0, 1.0], got {}",
                config.classifier.top_p
            ),
        });
    }

    if config.classifier.top_k < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "classifier.top_k must be at least 1, got {}",
                config.classifier.top_k
            ),
        });
    }

    // Validate conversation window parameters
    if config.conversation.window_budget == 0 {
        errors.push(ConfigError::Validation {
            message: "conversation.window_budget must be greater than 0".to_string(),
        });
    }

    if config.conversation.cost_divisor == 0 {
        errors.push(ConfigError::Validation {
            message: "conversation.cost_divisor must be greater than 0".to_string(),
        });
    }

    if config.conversation.window_budget > 0
        && config.conversation.template_cost >= config.conversation.window_budget
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "conversation.template_cost ({}) must be less than conversation.window_budget ({})",
                config.conversation.template_cost, config.conversation.window_budget
            ),
        });
    }

    // Validate preferences path is not empty
    if config.preferences.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "preferences.path must not be empty".to_string(),
        });
    }

    // Validate log level
    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` must be one of: {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts anything that parses as an IP address or that sticks to
/// hostname characters. Not a full RFC hostname check.
fn plausible_host(host: &str) -> bool {
    host.parse::<std::net::IpAddr>().is_ok()
        || host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':')
}
