// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading built on Figment.
//!
//! Values merge from compiled defaults through `/etc/patchbay/patchbay.toml`,
//! the XDG config directory, and `./patchbay.toml`, with `PATCHBAY_`
//! environment variables taking final precedence.

#![allow(clippy::result_large_err)] // figment::Error is large and not ours to box

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PatchbayConfig;

/// Section names recognized when mapping environment variables onto
/// dotted config paths.
const ENV_SECTIONS: [&str; 6] = [
    "server",
    "upstream",
    "classifier",
    "conversation",
    "preferences",
    "log",
];

/// Load configuration from the standard lookup chain.
///
/// Later sources override earlier ones: compiled defaults, then
/// `/etc/patchbay/patchbay.toml`, the user XDG config, `./patchbay.toml`
/// in the working directory, and finally `PATCHBAY_*` environment
/// variables.
pub fn load_config() -> Result<PatchbayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PatchbayConfig::default()))
        .merge(Toml::file("/etc/patchbay/patchbay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("patchbay/patchbay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("patchbay.toml"))
        .merge(env_overrides())
        .extract()
}

/// Load configuration from a TOML string alone, skipping file lookup and
/// environment overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<PatchbayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PatchbayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honoring `PATCHBAY_*`
/// environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<PatchbayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PatchbayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
}

/// Environment provider mapping `PATCHBAY_<SECTION>_<FIELD>` onto dotted
/// config paths.
///
/// `Env::split("_")` would also split underscores inside field names
/// (`PATCHBAY_UPSTREAM_CHAT_PATH` must become `upstream.chat_path`, not
/// `upstream.chat.path`), so the section prefix is peeled off explicitly
/// instead.
fn env_overrides() -> Env {
    Env::prefixed("PATCHBAY_").map(|key| {
        // the variable name arrives lowercased with the prefix stripped,
        // e.g. PATCHBAY_UPSTREAM_CHAT_PATH -> "upstream_chat_path"
        let name = key.as_str();
        for section in ENV_SECTIONS {
            let marker = format!("{section}_");
            if let Some(field) = name.strip_prefix(marker.as_str()) {
                return format!("{section}.{field}").into();
            }
        }
        name.to_string().into()
    })
}
