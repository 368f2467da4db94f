//! The MCP server surface.

use std::sync::Arc;

use log::{error, warn};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};

use pihole_client::{Params, PiHoleApi};
use pihole_common::ToolDefinition;

use crate::error::ToolError;
use crate::handler::ToolHandler;

/// Name reported during the protocol handshake.
pub const SERVER_NAME: &str = "pihole-mcp-server";

const INSTRUCTIONS: &str = "Administers a Pi-hole DNS filter: read status and statistics, \
toggle blocking, manage the allow and deny lists, and inspect or flush logs.";

/// Serves the tool catalog over MCP.
#[derive(Debug, Clone)]
pub struct PiHoleServer {
    handler: ToolHandler,
}

impl PiHoleServer {
    #[must_use]
    pub fn new(api: Arc<dyn PiHoleApi>) -> Self {
        Self {
            handler: ToolHandler::new(api),
        }
    }

    /// The catalog as protocol tool descriptors.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        self.handler
            .tools()
            .into_iter()
            .filter_map(|definition| to_mcp_tool(&definition))
            .collect()
    }

    /// Invokes a tool, wrapping its JSON result as one text item.
    ///
    /// # Errors
    ///
    /// Returns the structured protocol error for the failure kind.
    pub async fn call(&self, name: &str, args: Option<Params>) -> Result<CallToolResult, ErrorData> {
        let args = args.unwrap_or_default();
        match self.handler.handle(name, &args).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(err) => {
                match &err {
                    ToolError::Client(_) | ToolError::Serialization(_) => {
                        error!("Tool '{name}' failed: {err}");
                    }
                    ToolError::MethodNotFound(_) | ToolError::InvalidParams(_) => {
                        warn!("Rejected call to '{name}': {err}");
                    }
                }
                Err(err.into())
            }
        }
    }
}

fn to_mcp_tool(definition: &ToolDefinition) -> Option<Tool> {
    match definition.parameters.to_json_object() {
        Ok(schema) => Some(Tool::new(
            definition.name.clone(),
            definition.description.clone(),
            Arc::new(schema),
        )),
        Err(e) => {
            error!("Dropping tool '{}': invalid schema: {e}", definition.name);
            None
        }
    }
}

impl ServerHandler for PiHoleServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                title: Some("Pi-hole MCP Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.call(&request.name, request.arguments).await
    }
}
