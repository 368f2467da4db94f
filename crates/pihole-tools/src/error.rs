//! Tool invocation errors and their mapping onto RPC error codes.

use rmcp::ErrorData;
use rmcp::model::ErrorCode;
use thiserror::Error;

use pihole_client::ClientError;

/// Why a tool invocation failed.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool has this name.
    #[error("Unknown tool: {0}")]
    MethodNotFound(String),

    /// A required argument is missing or malformed. Raised before any network call.
    #[error("{0}")]
    InvalidParams(String),

    /// The appliance call failed (authentication, upstream status, transport).
    #[error("Tool execution failed: {0}")]
    Client(#[source] ClientError),

    /// The result could not be rendered.
    #[error("Failed to render result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ClientError> for ToolError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::UnknownOperation(name) => Self::MethodNotFound(name),
            ClientError::InvalidParams(message) => Self::InvalidParams(message),
            other => Self::Client(other),
        }
    }
}

impl ToolError {
    /// The RPC error code this error is reported with.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MethodNotFound(_) => ErrorCode::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => ErrorCode::INVALID_PARAMS,
            Self::Client(_) | Self::Serialization(_) => ErrorCode::INTERNAL_ERROR,
        }
    }
}

impl From<ToolError> for ErrorData {
    fn from(err: ToolError) -> Self {
        Self::new(err.code(), err.to_string(), None)
    }
}
