//! Connectivity check: probe the appliance and print a report to stderr.

use std::path::Path;

use colored::Colorize;
use serde_json::Value;
use tracing::warn;

use pihole_client::{ClientError, PiHoleClient};

use crate::error::{Result, ServerError};

/// Probes login info, authentication and the summary endpoint.
///
/// `source` is the configuration file the settings came from, if any.
///
/// # Errors
///
/// Returns [`ServerError::CheckFailed`] with the number of failed probes.
pub async fn run(client: &PiHoleClient, source: Option<&Path>) -> Result<()> {
    let config = client.config();

    eprintln!("{}", "Pi-hole connectivity check".bright_magenta().bold());
    eprintln!("  {} {}", "Config file:".bold(), describe_source(source));
    eprintln!("  {} {}", "Base URL:".bold(), config.base_url());
    eprintln!(
        "  {} {}",
        "Password:".bold(),
        if config.is_anonymous() {
            "not configured".yellow()
        } else {
            "configured".normal()
        }
    );
    eprintln!();

    let mut failures = 0;

    failures += report(
        "Login info",
        client.get_login_info().await.map(|v| describe_login(&v)),
    );

    if config.is_anonymous() {
        eprintln!(
            "  {} Authentication: skipped (no password configured)",
            "-".yellow()
        );
    } else {
        failures += report(
            "Authentication",
            client
                .session()
                .ensure_authenticated()
                .await
                .map(|()| "session established".to_string()),
        );
    }

    failures += report(
        "Summary",
        client.get_summary().await.map(|v| describe_summary(&v)),
    );

    if let Err(e) = client.logout().await {
        warn!("Failed to close Pi-hole session: {e}");
    }

    eprintln!();
    if failures == 0 {
        eprintln!("{}", "All checks passed".green().bold());
        Ok(())
    } else {
        eprintln!("{}", format!("{failures} check(s) failed").red().bold());
        Err(ServerError::CheckFailed(failures))
    }
}

fn report(label: &str, result: std::result::Result<String, ClientError>) -> usize {
    match result {
        Ok(detail) => {
            eprintln!("  {} {label}: {detail}", "✓".green());
            0
        }
        Err(e) => {
            eprintln!("  {} {label}: {e}", "✗".red());
            1
        }
    }
}

fn describe_source(source: Option<&Path>) -> String {
    source.map_or_else(
        || "none (environment only)".to_string(),
        |path| path.display().to_string(),
    )
}

fn describe_login(value: &Value) -> String {
    match value.get("dns").and_then(Value::as_bool) {
        Some(true) => "reachable, DNS resolver running".to_string(),
        Some(false) => "reachable, DNS resolver not running".to_string(),
        None => "reachable".to_string(),
    }
}

fn describe_summary(value: &Value) -> String {
    match (
        value.pointer("/queries/total"),
        value.pointer("/queries/blocked"),
    ) {
        (Some(total), Some(blocked)) => format!("{total} queries today, {blocked} blocked"),
        _ => "ok".to_string(),
    }
}
