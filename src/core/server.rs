//! MCP Server implementation - one instance per session.
//!
//! Each `McpServer` binds the shared [`AppContext`] to the call context of a
//! single session. Sessions served by rmcp (STDIO/TCP) get a `ToolRouter`;
//! HTTP request sessions get a `ToolTable`. Only one is filled per session.
//!
//! **Adding a new tool does NOT require modifying this file!** Tools come
//! from the contract registry.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::app::AppContext;
use super::auth::CallContext;
use crate::domains::tools::{RouterRuntime, ToolError, ToolTable};

const INSTRUCTIONS_HEADER: &str = "Task management server. Every tool below mirrors a REST \
operation and requires Basic authorization.";

/// The MCP server handler for one session.
#[derive(Clone)]
pub struct McpServer {
    /// Shared application state.
    app: Arc<AppContext>,

    /// Transport metadata presented with every call of this session.
    call_context: CallContext,

    /// Tool router for handling tool calls (rmcp sessions only).
    tool_router: ToolRouter<Self>,

    /// Tools callable without an rmcp service (HTTP sessions only).
    tools: ToolTable,
}

impl McpServer {
    /// Create an rmcp session (STDIO/TCP) bound to the given call context.
    pub fn new(app: Arc<AppContext>, call_context: CallContext) -> Self {
        let mut router = RouterRuntime::new(call_context.clone());
        app.registrar().register_all(&mut router);
        let tool_router = router.into_router();

        debug!("Session created with {} tools", tool_router.list_all().len());
        Self {
            app,
            call_context,
            tool_router,
            tools: ToolTable::new(),
        }
    }

    /// Create a session for one HTTP JSON-RPC request.
    pub fn for_request(app: Arc<AppContext>, call_context: CallContext) -> Self {
        let mut tools = ToolTable::new();
        app.registrar().register_all(&mut tools);

        Self {
            app,
            call_context,
            tool_router: ToolRouter::new(),
            tools,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.app.config().server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.app.config().server.version
    }

    /// Server instructions, listing each tool's guidance.
    pub fn instructions(&self) -> String {
        self.app.catalog().instructions(INSTRUCTIONS_HEADER)
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tools
            .list()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => JsonObject::new(),
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "expected an object, got {other}"
                )));
            }
        };
        let result = self
            .tools
            .call(name, arguments, self.call_context.clone())
            .await?;
        serde_json::to_value(result).map_err(|e| ToolError::internal(e.to_string()))
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::basic_authorization;
    use crate::core::config::Config;

    fn app() -> Arc<AppContext> {
        AppContext::initialize(Config::default()).unwrap()
    }

    #[test]
    fn test_server_lists_task_tools() {
        let server = McpServer::for_request(app(), CallContext::new());
        let tools = server.list_tools();
        assert_eq!(tools.len(), 6);
        assert!(tools.iter().any(|t| t["name"] == "tasks_search_tasks"));
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[test]
    fn test_sessions_register_once() {
        let app = app();
        let rmcp_session = McpServer::new(app.clone(), CallContext::new());
        assert_eq!(rmcp_session.tool_router.list_all().len(), 6);
        assert!(rmcp_session.tools.is_empty());

        let http_session = McpServer::for_request(app, CallContext::new());
        assert!(http_session.tool_router.list_all().is_empty());
        assert_eq!(http_session.tools.len(), 6);
    }

    #[test]
    fn test_info_lists_guidance() {
        let server = McpServer::new(app(), CallContext::new());
        let info = server.get_info();
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("tasks_create_task"));
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_call_tool_uses_session_context() {
        let app = app();
        let anonymous = McpServer::for_request(app.clone(), CallContext::new());
        let result = anonymous
            .call_tool("tasks_list_tasks", serde_json::json!({}))
            .await
            .unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("❌ Error [USER]:"));

        let context =
            CallContext::with_authorization(Some(&basic_authorization("demo", "demo123")));
        let authorized = McpServer::for_request(app, context);
        let result = authorized
            .call_tool("tasks_list_tasks", serde_json::json!({ "limit": 2 }))
            .await
            .unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        let list: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(list["total"], 5);
        assert_eq!(list["tasks"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_call_tool_errors() {
        let server = McpServer::for_request(app(), CallContext::new());
        assert!(matches!(
            server.call_tool("nope", serde_json::json!({})).await,
            Err(ToolError::NotFound(_))
        ));
        assert!(matches!(
            server.call_tool("tasks_list_tasks", serde_json::json!([1])).await,
            Err(ToolError::InvalidArguments(_))
        ));
    }
}
