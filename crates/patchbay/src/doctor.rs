// SPDX-FileCopyrightText: 2026 Patchbay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `patchbay doctor` subcommand.
//!
//! Probes the config, the preference document, the classifier endpoint,
//! and the upstream origin, then prints one line per probe so an operator
//! can see at a glance which collaborator is broken.

use std::time::{Duration, Instant};

use patchbay_config::model::PatchbayConfig;
use patchbay_core::{CollaboratorAdapter, HealthStatus, PatchbayError};
use patchbay_ollama::OllamaClassifier;
use patchbay_store::FilePreferenceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// Degraded but usable.
    Warn,
    Fail,
}

impl CheckStatus {
    fn tag(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "FAIL",
        }
    }
}

/// One probe's outcome, with how long the probe took.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
    pub duration: Duration,
}

/// Run every probe and print the report.
///
/// Returns whether the run is clean enough to proceed; warnings are
/// reported but do not fail it.
pub async fn run_doctor(config: &PatchbayConfig) -> Result<bool, PatchbayError> {
    let results = vec![
        check_config().await,
        check_preferences(config).await,
        check_classifier(config).await,
        check_upstream(config).await,
    ];

    println!();
    println!("  patchbay doctor");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!(
            "    {:<4} {:<18} {} [{} ms]",
            result.status.tag(),
            result.name,
            result.detail,
            result.duration.as_millis()
        );
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let flagged = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();

    if flagged == 0 {
        println!("  everything looks healthy.");
    } else {
        println!("  {flagged} check(s) need attention.");
    }
    println!();

    Ok(failed == 0)
}

/// Maps a collaborator health report onto a check result.
fn health_to_check(
    name: &str,
    health: Result<HealthStatus, PatchbayError>,
    start: Instant,
) -> CheckResult {
    let (status, detail) = match health {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
        Err(e) => (CheckStatus::Fail, format!("check failed: {e}")),
    };

    CheckResult {
        name: name.to_string(),
        status,
        detail,
        duration: start.elapsed(),
    }
}

async fn check_config() -> CheckResult {
    let start = Instant::now();
    let (status, detail) = match patchbay_config::load_and_validate() {
        Ok(_) => (CheckStatus::Pass, "loads cleanly".to_string()),
        Err(errors) => (
            CheckStatus::Fail,
            format!("{} validation problem(s)", errors.len()),
        ),
    };
    CheckResult {
        name: "config".to_string(),
        status,
        detail,
        duration: start.elapsed(),
    }
}

async fn check_preferences(config: &PatchbayConfig) -> CheckResult {
    let start = Instant::now();
    let store = FilePreferenceStore::new(&config.preferences);
    health_to_check("preferences", store.health_check().await, start)
}

async fn check_classifier(config: &PatchbayConfig) -> CheckResult {
    let start = Instant::now();
    match OllamaClassifier::from_config(&config.classifier) {
        Ok(classifier) => health_to_check("classifier", classifier.health_check().await, start),
        Err(e) => CheckResult {
            name: "classifier".to_string(),
            status: CheckStatus::Fail,
            detail: format!("client build failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

async fn check_upstream(config: &PatchbayConfig) -> CheckResult {
    let start = Instant::now();

    let client = match reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            return CheckResult {
                name: "upstream".to_string(),
                status: CheckStatus::Fail,
                detail: format!("client build failed: {e}"),
                duration: start.elapsed(),
            };
        }
    };

    // Any HTTP answer counts; the status code is the upstream's business.
    let (status, detail) = match client.head(&config.upstream.origin).send().await {
        Ok(_) => (CheckStatus::Pass, "answers HTTP".to_string()),
        Err(e) => (CheckStatus::Fail, format!("no answer: {e}")),
    };
    CheckResult {
        name: "upstream".to_string(),
        status,
        detail,
        duration: start.elapsed(),
    }
}
