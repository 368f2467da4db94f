//! # pihole-client
//!
//! Client library for the Pi-hole v6 REST API.
//!
//! The crate is built around an operation table ([`Operation`]) describing
//! how each logical operation maps onto the appliance's HTTP surface, and a
//! dispatcher ([`PiHoleClient`]) that performs them:
//! - Session tokens are acquired lazily and reused until rejected
//! - A rejected token triggers exactly one re-authentication and retry
//! - Public endpoints are never sent a token
//! - Domain path parameters are percent-encoded
//!
//! ## Example
//!
//! ```no_run
//! use pihole_client::{Operation, PiHoleApi, PiHoleClient};
//! use pihole_common::Config;
//!
//! # async fn example() -> Result<(), pihole_client::ClientError> {
//! let config = Config::new("http://192.168.1.2").with_password("app-password");
//! let client = PiHoleClient::new(config)?;
//!
//! let summary = client.get_summary().await?;
//! println!("{summary:#}");
//!
//! let mut params = pihole_client::Params::new();
//! params.insert("domain".into(), "ads.example.com".into());
//! client.execute(Operation::AddToBlacklist, params).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use pihole_common::Config;

pub mod client;
pub mod endpoint;
pub mod error;
pub mod operation;
pub mod session;

pub use client::{MAX_ATTEMPTS, PiHoleClient};
pub use endpoint::{EndpointAccess, PUBLIC_ENDPOINTS, is_admin_endpoint};
pub use error::ClientError;
pub use operation::{HttpMethod, Operation, OperationDescriptor, Params};
pub use session::SessionManager;

/// Anything that can perform appliance operations.
///
/// [`PiHoleClient`] is the real implementation; the tool layer depends only
/// on this trait.
#[async_trait]
pub trait PiHoleApi: Send + Sync {
    /// The connection settings in use.
    fn config(&self) -> &Config;

    /// Performs `operation` with `params` and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] describing why the operation failed.
    async fn execute(&self, operation: Operation, params: Params) -> Result<Value, ClientError>;
}
