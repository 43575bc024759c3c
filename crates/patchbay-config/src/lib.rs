// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Patchbay relay gateway.
//!
//! TOML files merge across the XDG lookup chain with `PATCHBAY_`
//! environment overrides on top. Schemas are strict (`deny_unknown_fields`)
//! and failures render as miette diagnostics carrying source spans and
//! typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use patchbay_config::load_and_validate;
//!
//! let config = load_and_validate().unwrap_or_else(|errors| {
//!     patchbay_config::render_errors(&errors);
//!     std::process::exit(1);
//! });
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PatchbayConfig;

/// Load configuration from the XDG lookup chain and validate it.
///
/// On a clean parse the semantic checks in [`validation`] run next; on a
/// Figment failure the error is expanded into per-problem diagnostics
/// with whatever source spans can be recovered from the TOML files.
pub fn load_and_validate() -> Result<PatchbayConfig, Vec<ConfigError>> {
    validated(loader::load_config(), collect_toml_sources)
}

/// Load configuration from one explicit file and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<PatchbayConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load configuration from a TOML string and validate it. Tests use this
/// to exercise the full pipeline without touching the filesystem.
pub fn load_and_validate_str(toml_content: &str) -> Result<PatchbayConfig, Vec<ConfigError>> {
    validated(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Run semantic validation on a parsed config, or expand a Figment error
/// into diagnostics. The source closure only runs on the error path.
fn validated(
    loaded: Result<PatchbayConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<PatchbayConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of every TOML file the lookup chain may have read, keyed by
/// display path, for resolving error spans.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![PathBuf::from("/etc/patchbay/patchbay.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("patchbay/patchbay.toml"));
    }
    candidates.push(local_config_path());

    candidates
        .iter()
        .filter_map(|path| read_source(path))
        .collect()
}

fn local_config_path() -> PathBuf {
    std::env::current_dir()
        .map(|dir| dir.join("patchbay.toml"))
        .unwrap_or_else(|_| PathBuf::from("patchbay.toml"))
}

fn read_source(path: &Path) -> Option<(String, String)> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| (path.display().to_string(), content))
}
