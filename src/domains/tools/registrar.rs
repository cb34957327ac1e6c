//! Tool Registrar - registers every catalog entry with a tool runtime.
//!
//! A runtime is anything that can hold named tools with callbacks:
//!
//! - [`RouterRuntime`] - builds the rmcp `ToolRouter` served over STDIO/TCP
//! - [`ToolTable`] - ordered table used by the HTTP JSON-RPC endpoint and tests
//!
//! Each registered callback carries the operation key and descriptor it was
//! built from, so the dispatcher never has to search the contract registry.

use futures::FutureExt;
use futures::future::BoxFuture;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, JsonObject, Tool},
};
use std::sync::Arc;
use tracing::{debug, info};

use super::catalog::{ToolCatalog, ToolDefinition};
use super::dispatcher::Dispatcher;
use super::error::ToolError;
use crate::core::auth::CallContext;

/// Callback run for one tool call.
pub type ToolCallback =
    Arc<dyn Fn(JsonObject, CallContext) -> BoxFuture<'static, CallToolResult> + Send + Sync>;

/// Something tools can be registered with.
pub trait ToolRuntime {
    /// Register a tool. A later registration under the same name replaces
    /// the earlier one.
    fn register_tool(&mut self, tool: Tool, callback: ToolCallback);
}

// ============================================================================
// rmcp Router Runtime
// ============================================================================

/// Builds a `ToolRouter` bound to one session's call context.
pub struct RouterRuntime<S> {
    router: ToolRouter<S>,
    context: CallContext,
}

impl<S> RouterRuntime<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(context: CallContext) -> Self {
        Self {
            router: ToolRouter::new(),
            context,
        }
    }

    pub fn into_router(self) -> ToolRouter<S> {
        self.router
    }
}

impl<S> ToolRuntime for RouterRuntime<S>
where
    S: Send + Sync + 'static,
{
    fn register_tool(&mut self, tool: Tool, callback: ToolCallback) {
        let context = self.context.clone();
        let route = ToolRoute::new_dyn(tool, move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let context = context.clone();
            let callback = callback.clone();
            async move { Ok::<_, McpError>(callback(args, context).await) }.boxed()
        });
        let router = std::mem::replace(&mut self.router, ToolRouter::new());
        self.router = router.with_route(route);
    }
}

// ============================================================================
// Tool Table
// ============================================================================

/// Ordered name-to-callback table.
#[derive(Clone, Default)]
pub struct ToolTable {
    entries: Vec<(Tool, ToolCallback)>,
}

impl ToolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered tools, in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.entries.iter().map(|(tool, _)| tool.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(tool, _)| tool.name.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke a tool by name.
    pub async fn call(
        &self,
        name: &str,
        arguments: JsonObject,
        context: CallContext,
    ) -> Result<CallToolResult, ToolError> {
        let callback = self
            .entries
            .iter()
            .find(|(tool, _)| tool.name == name)
            .map(|(_, callback)| callback.clone())
            .ok_or_else(|| ToolError::not_found(name))?;
        Ok(callback(arguments, context).await)
    }
}

impl ToolRuntime for ToolTable {
    fn register_tool(&mut self, tool: Tool, callback: ToolCallback) {
        match self.entries.iter_mut().find(|(t, _)| t.name == tool.name) {
            Some(entry) => *entry = (tool, callback),
            None => self.entries.push((tool, callback)),
        }
    }
}

// ============================================================================
// Registrar
// ============================================================================

/// Binds catalog entries to dispatcher callbacks.
#[derive(Clone)]
pub struct ToolRegistrar {
    catalog: Arc<ToolCatalog>,
    dispatcher: Arc<Dispatcher>,
}

impl ToolRegistrar {
    pub fn new(catalog: Arc<ToolCatalog>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            catalog,
            dispatcher,
        }
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Register every catalog entry with the runtime.
    pub fn register_all<R: ToolRuntime + ?Sized>(&self, runtime: &mut R) {
        for definition in self.catalog.tools() {
            debug!("Registering tool {}", definition.name);
            runtime.register_tool(definition.to_tool(), self.callback_for(definition));
        }
        info!("Registered {} MCP tools", self.catalog.len());
    }

    fn callback_for(&self, definition: &ToolDefinition) -> ToolCallback {
        let dispatcher = self.dispatcher.clone();
        let origin = definition.origin;
        let descriptor = definition.descriptor.clone();
        Arc::new(move |arguments: JsonObject, context: CallContext| {
            let dispatcher = dispatcher.clone();
            let descriptor = descriptor.clone();
            async move {
                dispatcher
                    .invoke(&origin, &descriptor, arguments, &context)
                    .await
            }
            .boxed()
        })
    }
}
