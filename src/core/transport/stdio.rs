//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default mode. The whole
//! process is one session, authorized by the configured session header.

use rmcp::ServiceExt;
use std::sync::Arc;
use tracing::{info, warn};

use super::{TransportError, TransportResult};
use crate::core::{AppContext, McpServer};

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    pub async fn run(app: Arc<AppContext>) -> TransportResult<()> {
        let context = app.session_context();
        if context.header("authorization").is_none() {
            warn!("No MCP_SESSION_AUTHORIZATION set; task tools will reject every call");
        }

        info!("Ready - communicating via stdin/stdout");

        let service = McpServer::new(app, context)
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
