//! # pihole-common
//!
//! Shared types for the Pi-hole MCP gateway.
//!
//! - [`Config`]: immutable connection settings for one appliance
//! - [`RetryConfig`]: backoff for connection failures
//! - [`ToolDefinition`], [`Parameters`], [`Property`]: tool schema types
//!
//! ## Example
//!
//! ```
//! use pihole_common::{Config, Parameters, Property, ToolDefinition};
//!
//! let config = Config::new("http://pi.hole").with_password("secret");
//! assert_eq!(config.base_url(), "http://pi.hole");
//!
//! let tool = ToolDefinition::builder()
//!     .name("add_to_whitelist")
//!     .description("Add a domain to the whitelist")
//!     .parameters(Parameters::single(
//!         "domain",
//!         Property::string("Domain to add to whitelist"),
//!         true,
//!     ))
//!     .build();
//! assert!(tool.parameters.is_required("domain"));
//! ```

/// Connection configuration.
pub mod config;
/// Tool schema types.
pub mod tools;

pub use config::{Config, DEFAULT_TIMEOUT_SECONDS, RetryConfig};
pub use tools::{Parameters, Property, ToolDefinition};
