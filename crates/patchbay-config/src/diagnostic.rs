// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rich diagnostics for configuration loading failures.
//!
//! Figment reports extraction problems as flat error values. This module
//! lifts them into miette diagnostics that point at the offending line of
//! the TOML source, list the keys a section accepts, and offer a
//! closest-match spelling suggestion via Jaro-Winkler similarity.

#![allow(unused_assignments)] // the Diagnostic derive expands to code that trips this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Scores below this Jaro-Winkler similarity are too weak to surface as a
/// spelling suggestion. 0.75 admits one-edit slips such as `endpont` for
/// `endpoint` or `windw_budget` for `window_budget` while rejecting
/// unrelated keys.
const MIN_SUGGESTION_SCORE: f64 = 0.75;

/// A configuration problem, carrying whatever context is available for
/// miette to render: a source span when the TOML line could be located,
/// the accepted key list, and a spelling suggestion.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section of the configuration accepts.
    #[error("no such configuration key: `{key}`")]
    #[diagnostic(
        code(patchbay::config::unknown_key),
        help("{}", key_hint(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The key as the user wrote it.
        key: String,
        /// Closest valid key, when one clears the similarity floor.
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
        /// Where the key sits in the TOML source, when it could be located.
        #[label("not a known key")]
        span: Option<SourceSpan>,
        /// The TOML document the span points into.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value that deserialized to the wrong type.
    #[error("wrong value type for `{key}`: {detail}")]
    #[diagnostic(
        code(patchbay::config::invalid_type),
        help("this field takes {expected}")
    )]
    InvalidType {
        /// Dotted path of the offending key.
        key: String,
        /// What was found and what the field wanted.
        detail: String,
        /// The type the field wanted.
        expected: String,
        /// Where the value sits in the TOML source.
        #[label("mismatched value here")]
        span: Option<SourceSpan>,
        /// The TOML document the span points into.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key the schema requires but no merged source provided.
    #[error("required key `{key}` was never set")]
    #[diagnostic(
        code(patchbay::config::missing_key),
        help("add `{key} = <value>` to your patchbay.toml")
    )]
    MissingKey {
        /// Dotted path of the absent key.
        key: String,
    },

    /// A value that deserialized cleanly but fails a semantic check.
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(patchbay::config::validation))]
    Validation {
        /// What the check rejected.
        message: String,
    },

    /// Any figment failure the other variants do not model.
    #[error("could not load configuration: {0}")]
    #[diagnostic(code(patchbay::config::other))]
    Other(String),
}

/// Help line for an unknown key: the closest-match suggestion when one
/// exists, always followed by the keys the section accepts.
fn key_hint(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(candidate) => format!("did you mean `{candidate}`? The section accepts: {valid_keys}"),
        None => format!("the section accepts: {valid_keys}"),
    }
}

/// Break a `figment::Error` apart into one `ConfigError` per problem.
///
/// Figment accumulates every failure it sees during extraction. Each is
/// classified by kind so unknown keys gain suggestions and source spans
/// while the rest map onto plainer variants.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| classify(error, toml_sources))
        .collect()
}

fn classify(error: figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        Kind::UnknownField(field, allowed) => unknown_key(&error, field, allowed, toml_sources),
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.clone().into_owned(),
        },
        Kind::InvalidType(found, wanted) => ConfigError::InvalidType {
            key: dotted_path(&error),
            detail: format!("found {found}, expected {wanted}"),
            expected: wanted.to_string(),
            span: None,
            src: None,
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

fn unknown_key(
    error: &figment::Error,
    field: &str,
    allowed: &[&str],
    toml_sources: &[(String, String)],
) -> ConfigError {
    let (span, src) = spanned_source(error, field, toml_sources).unzip();
    ConfigError::UnknownKey {
        key: field.to_string(),
        suggestion: suggest_key(field, allowed),
        valid_keys: allowed.join(", "),
        span,
        src,
    }
}

fn dotted_path(error: &figment::Error) -> String {
    error
        .path
        .iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Locate `field` in whichever TOML document figment attributes the error
/// to, producing the span and named source miette needs for a label.
fn spanned_source(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let path = file_source_path(error)?;
    let (name, content) = toml_sources.iter().find(|(candidate, _)| *candidate == path)?;
    let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
    let offset = find_key_offset(content, &section, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(name, content.clone()),
    ))
}

fn file_source_path(error: &figment::Error) -> Option<String> {
    match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => Some(path.display().to_string()),
        _ => None,
    }
}

/// Byte offset of `field` within its TOML section.
///
/// Scans the document line by line, tracking which `[section]` header is
/// active. `field` only matches while the scanner is inside the section
/// named by the first element of `path` (or before any header, when
/// `path` is empty), so a key spelled the same in a different section is
/// never mistaken for the offending one.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let target = path.first().map(String::as_str);
    let mut in_target = target.is_none();
    let mut offset = 0;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = rest.find(']').map(|end| &rest[..end]);
            in_target = name.is_some() && name == target;
        } else if in_target {
            if let Some(rest) = trimmed.strip_prefix(field) {
                if matches!(rest.bytes().next(), Some(b'=' | b' ' | b'\t')) {
                    return Some(offset + (line.len() - trimmed.len()));
                }
            }
        }
        offset += line.len() + 1;
    }

    None
}

/// Closest valid key by Jaro-Winkler similarity, if any clears the floor.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), *candidate))
        .filter(|(score, _)| *score > MIN_SUGGESTION_SCORE)
        .max_by(|(left, _), (right, _)| left.total_cmp(right))
        .map(|(_, candidate)| candidate.to_string())
}

/// Print every error to stderr through miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
