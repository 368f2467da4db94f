//! Pi-hole MCP server
//!
//! Serves Pi-hole administration tools over the Model Context Protocol on
//! stdio. Logs go to stderr; stdout carries the protocol.

mod check;
mod config;
mod error;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::stream::StreamExt;
use rmcp::ServiceExt;
use serde::Serialize;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::{error, info, warn};

use pihole_client::PiHoleClient;
use pihole_common::ToolDefinition;
use pihole_tools::{PiHoleServer, ToolCategory, catalog};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

#[derive(Parser, Debug)]
#[command(name = "pihole-mcp-server", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Run the MCP server on stdio (default)
    #[default]
    Serve,
    /// Check connectivity and credentials against the configured Pi-hole
    Check,
    /// Print the tool catalog as JSON, grouped by category
    Tools,
}

/// Initializes structured logging with tracing, always on stderr.
///
/// Supports two output formats via `PIHOLE_MCP_LOG_FORMAT`:
/// - `json`: Machine-readable JSON logs
/// - `pretty`: Human-readable formatted logs (default)
///
/// Log level is controlled via `RUST_LOG`.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("PIHOLE_MCP_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("pihole_mcp_server=info,pihole_client=info,pihole_tools=info")
    });

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

fn load_config() -> Result<ServerConfig> {
    ServerConfig::load().inspect_err(|e| {
        error!("Failed to load configuration: {e}");
        if let Some(path) = ServerConfig::config_path() {
            error!("Optional config file location: {}", path.display());
        }
    })
}

async fn serve(config: ServerConfig) -> Result<()> {
    let client = PiHoleClient::new(config.client)?;
    info!("Connecting to Pi-hole at {}", client.config().base_url());

    let server = PiHoleServer::new(Arc::new(client.clone()));
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;

    info!("Pi-hole MCP server running on stdio");

    // Set up signal handlers
    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let signals_handle = signals.handle();
    let cancel = service.cancellation_token();
    let signal_task = tokio::spawn(async move {
        while let Some(signal) = signals.next().await {
            match signal {
                SIGTERM => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                    cancel.cancel();
                    break;
                }
                SIGINT => {
                    info!("Received SIGINT, initiating graceful shutdown");
                    cancel.cancel();
                    break;
                }
                _ => {}
            }
        }
    });

    let quit_reason = service
        .waiting()
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;
    info!("MCP session ended: {quit_reason:?}");

    signals_handle.close();
    signal_task.abort();

    if let Err(e) = client.logout().await {
        warn!("Failed to close Pi-hole session: {e}");
    }

    info!("Shutdown complete");
    Ok(())
}

async fn check(config: ServerConfig) -> Result<()> {
    let client = PiHoleClient::new(config.client)?;
    check::run(&client, config.source.as_deref()).await
}

#[derive(Serialize)]
struct CategoryListing {
    category: ToolCategory,
    tools: Vec<ToolDefinition>,
}

fn tool_listing() -> Vec<CategoryListing> {
    catalog::grouped()
        .into_iter()
        .map(|(category, tools)| CategoryListing { category, tools })
        .collect()
}

fn print_tools() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&tool_listing())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command.unwrap_or_default() {
        Command::Serve => serve(load_config()?).await,
        Command::Check => check(load_config()?).await,
        Command::Tools => print_tools(),
    };

    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["pihole-mcp-server"]).unwrap();
        assert!(matches!(cli.command.unwrap_or_default(), Command::Serve));

        let cli = Cli::try_parse_from(["pihole-mcp-server", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check)));
    }

    #[test]
    fn test_tool_listing_groups_by_category() {
        let value = serde_json::to_value(tool_listing()).unwrap();
        let groups = value.as_array().unwrap();
        assert_eq!(groups.len(), 6);
        assert_eq!(groups[0]["category"], "status");
        assert_eq!(groups[0]["tools"][0]["name"], "get_pihole_status");
        assert_eq!(groups[4]["category"], "domain_management");
        assert_eq!(
            groups[4]["tools"][0]["inputSchema"]["required"],
            serde_json::json!(["domain"])
        );
    }
}
