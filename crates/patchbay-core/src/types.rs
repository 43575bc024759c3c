// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Patchbay workspace: conversation
//! messages, the route catalog, per-request routing snapshots, and the
//! intercepted-request snapshot that crosses the bridge.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Speaker role of a conversation message.
///
/// Anything that is not `user` or `assistant` (system prompts, tool
/// results, future roles) maps to [`Role::Other`] instead of failing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Assistant,
    Other,
}

impl Role {
    /// Parses a role string, mapping unknown values to [`Role::Other`].
    pub fn parse(value: &str) -> Role {
        value.parse().unwrap_or(Role::Other)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

/// A single message of the conversation being classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One user-defined route: a named intent with a usage description and the
/// model that should serve it. Created by the settings collaborator and
/// read-only to the relay core. Names are unique within a catalog.
///
/// The preference store schema uses the key `model` for the target model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePreference {
    pub name: String,
    pub usage: String,
    #[serde(rename = "model")]
    pub target_model: String,
}

/// Ordered list of route preferences. Order affects only how routes are
/// presented in the classification prompt, never matching semantics.
pub type RouteCatalog = Vec<RoutePreference>;

/// Keys addressable in the preference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum PreferenceKey {
    #[strum(serialize = "routingEnabled")]
    RoutingEnabled,
    #[strum(serialize = "preferences")]
    Preferences,
    #[strum(serialize = "defaultModel")]
    DefaultModel,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 3] = [
        PreferenceKey::RoutingEnabled,
        PreferenceKey::Preferences,
        PreferenceKey::DefaultModel,
    ];
}

/// A (possibly partial) preference record as read from or written to the
/// preference store. Absent fields were either not requested on `get` or
/// are left untouched on `set`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Vec<RoutePreference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl PreferenceRecord {
    /// Merges fields present in `incoming` over this record.
    pub fn merge(&mut self, incoming: PreferenceRecord) {
        if let Some(enabled) = incoming.routing_enabled {
            self.routing_enabled = Some(enabled);
        }
        if let Some(preferences) = incoming.preferences {
            self.preferences = Some(preferences);
        }
        if let Some(model) = incoming.default_model {
            self.default_model = Some(model);
        }
    }

    /// Returns a copy containing only the requested keys.
    pub fn select(&self, keys: &[PreferenceKey]) -> PreferenceRecord {
        let mut selected = PreferenceRecord::default();
        for key in keys {
            match key {
                PreferenceKey::RoutingEnabled => selected.routing_enabled = self.routing_enabled,
                PreferenceKey::Preferences => {
                    selected.preferences = self.preferences.clone();
                }
                PreferenceKey::DefaultModel => {
                    selected.default_model = self.default_model.clone();
                }
            }
        }
        selected
    }

    pub fn is_empty(&self) -> bool {
        self.routing_enabled.is_none()
            && self.preferences.is_none()
            && self.default_model.is_none()
    }
}

/// Routing state snapshotted once per intercepted request from the
/// preference store. Never mutated by the relay core; concurrent sessions
/// each read their own snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingSnapshot {
    pub routing_enabled: bool,
    pub catalog: RouteCatalog,
    pub default_model: Option<String>,
}

impl RoutingSnapshot {
    /// Builds a snapshot from a (possibly partial) store record, applying
    /// defaults for absent fields: routing disabled, empty catalog, no
    /// default model.
    pub fn from_record(record: PreferenceRecord) -> Self {
        Self {
            routing_enabled: record.routing_enabled.unwrap_or(false),
            catalog: record.preferences.unwrap_or_default(),
            default_model: record.default_model,
        }
    }

    /// The snapshot used when the store cannot be read: dispatch requests
    /// with their original, unmodified model field.
    pub fn unconfigured() -> Self {
        Self::default()
    }
}

/// Credentials disposition of the intercepted call, carried for logging
/// fidelity. The actual credential material rides in the snapshot headers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsMode {
    Omit,
    SameOrigin,
    Include,
}

/// Snapshot of an outbound call taken at interception time.
///
/// The caller's cancellation signal is deliberately not captured: it cannot
/// cross the bridge, so cancelling the original call has no effect on the
/// upstream dispatch. A dropped consumer is detected only when a bridge
/// send fails.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedRequest {
    /// Target URL as the caller issued it; may be origin-relative.
    pub url: String,
    pub method: String,
    /// Header pairs in arrival order, repeats preserved.
    pub headers: Vec<(String, String)>,
    pub credentials: CredentialsMode,
    pub body: Option<Vec<u8>>,
}

impl InterceptedRequest {
    /// The path component of the target URL, with any scheme, authority,
    /// and query string stripped.
    pub fn path(&self) -> &str {
        let without_authority = match self.url.find("://") {
            Some(scheme_end) => {
                let rest = &self.url[scheme_end + 3..];
                match rest.find('/') {
                    Some(slash) => &rest[slash..],
                    None => "/",
                }
            }
            None => self.url.as_str(),
        };
        without_authority
            .split('?')
            .next()
            .unwrap_or(without_authority)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_options(&self) -> bool {
        self.method.eq_ignore_ascii_case("OPTIONS")
    }
}

/// Health status reported by collaborator health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Collaborator is fully operational.
    Healthy,
    /// Collaborator is operational but experiencing issues.
    Degraded(String),
    /// Collaborator is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Preferences,
    Conversation,
    Classifier,
}
