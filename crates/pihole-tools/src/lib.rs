//! # pihole-tools
//!
//! Exposes Pi-hole administration as MCP tools.
//!
//! ## Core Components
//!
//! - [`catalog`]: the static tool catalog (names, descriptions, input schemas)
//! - [`ToolHandler`]: validates and shapes tool arguments, then dispatches
//!   them through a [`PiHoleApi`](pihole_client::PiHoleApi)
//! - [`PiHoleServer`]: the `rmcp` [`ServerHandler`](rmcp::ServerHandler)
//!   serving the catalog
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pihole_client::PiHoleClient;
//! use pihole_common::Config;
//! use pihole_tools::PiHoleServer;
//! use rmcp::ServiceExt;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = PiHoleClient::new(Config::new("http://pi.hole").with_password("secret"))?;
//! let server = PiHoleServer::new(Arc::new(client));
//!
//! server.serve(rmcp::transport::stdio()).await?.waiting().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Mapping
//!
//! Unknown tools are reported as `METHOD_NOT_FOUND` and bad arguments as
//! `INVALID_PARAMS`, both without contacting the appliance. Every other
//! failure becomes `INTERNAL_ERROR`.

pub mod catalog;
pub mod error;
pub mod handler;
pub mod server;

pub use catalog::{DEFAULT_COUNT, DEFAULT_TAIL_LINES, ToolCategory};
pub use error::ToolError;
pub use handler::ToolHandler;
pub use server::{PiHoleServer, SERVER_NAME};
