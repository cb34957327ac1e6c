//! Route Dispatcher - turns a flat tool argument object into a handler call.
//!
//! Arguments are split into path, query and body buckets according to the
//! operation's declared fields, the handler is resolved by operation key,
//! and the outcome is rendered as tool text. Failures are classified as
//! USER or SYSTEM exactly like the REST surface does.

use futures::FutureExt;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::error::{ClassifiedError, ErrorKind};
use crate::contracts::{OperationDescriptor, OperationKey, ParamLocation};
use crate::core::auth::{Authenticator, CallContext};
use crate::domains::routes::{HandlerRegistry, RouteError, RouteRequest, RouteResponse};

// ============================================================================
// Errors
// ============================================================================

/// Raw failure of one dispatch, before classification.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered at the operation's key.
    #[error("Route not found: {0}")]
    UnresolvedHandler(OperationKey),

    /// The handler reported a failure.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The handler panicked.
    #[error("Route execution failed: {0}")]
    Panicked(String),

    /// The response body could not be rendered.
    #[error("Failed to render response: {0}")]
    Render(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn classify(&self) -> ClassifiedError {
        match self {
            Self::Route(err) => ClassifiedError::from(err),
            other => ClassifiedError::classify(None, other.to_string()),
        }
    }
}

// ============================================================================
// Reclassification
// ============================================================================

/// Tool arguments split by declared location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBuckets {
    pub params: JsonObject,
    pub query: JsonObject,
    /// `None` when no body field was supplied.
    pub body: Option<JsonObject>,
    /// Keys no location declares.
    pub dropped: Vec<String>,
}

/// Route each argument to the first location declaring it: path, then
/// query, then body. Undeclared keys are dropped.
pub fn reclassify(descriptor: &OperationDescriptor, arguments: JsonObject) -> ParamBuckets {
    let mut buckets = ParamBuckets::default();
    let mut body = JsonObject::new();

    for (key, value) in arguments {
        match descriptor.location_of(&key) {
            Some(ParamLocation::Path) => {
                buckets.params.insert(key, value);
            }
            Some(ParamLocation::Query) => {
                buckets.query.insert(key, value);
            }
            Some(ParamLocation::Body) => {
                body.insert(key, value);
            }
            None => buckets.dropped.push(key),
        }
    }

    if !body.is_empty() {
        buckets.body = Some(body);
    }
    buckets
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Executes tool calls against the handler registry.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<HandlerRegistry>,
    authenticator: Authenticator,
}

impl Dispatcher {
    pub fn new(handlers: Arc<HandlerRegistry>, authenticator: Authenticator) -> Self {
        Self {
            handlers,
            authenticator,
        }
    }

    /// Build the handler request for a set of tool arguments.
    pub fn build_request(
        &self,
        origin: &OperationKey,
        descriptor: &OperationDescriptor,
        arguments: JsonObject,
        context: &CallContext,
    ) -> RouteRequest {
        let buckets = reclassify(descriptor, arguments);
        if !buckets.dropped.is_empty() {
            warn!(
                "Ignoring undeclared arguments for {}: {}",
                origin,
                buckets.dropped.join(", ")
            );
        }

        let auth = self.authenticator.authenticate(context);
        let mut request = RouteRequest::new(context, auth);
        request.params = buckets.params;
        request.query = buckets.query;
        request.body = buckets.body;
        request
    }

    /// Resolve and run the handler, returning its raw outcome.
    ///
    /// A handler response with status >= 400 counts as a failure.
    pub async fn dispatch(
        &self,
        origin: &OperationKey,
        descriptor: &OperationDescriptor,
        arguments: JsonObject,
        context: &CallContext,
    ) -> Result<RouteResponse, DispatchError> {
        let handler = self
            .handlers
            .get(origin)
            .ok_or(DispatchError::UnresolvedHandler(*origin))?;
        let request = self.build_request(origin, descriptor, arguments, context);

        let response = AssertUnwindSafe(handler.handle(request))
            .catch_unwind()
            .await
            .map_err(|panic| DispatchError::Panicked(panic_message(panic.as_ref())))??;

        if response.status >= 400 {
            return Err(failure_from_response(response).into());
        }
        if !descriptor.declares_status(response.status) {
            warn!("{} returned undeclared status {}", origin, response.status);
        }
        Ok(response)
    }

    /// Run one tool call end to end and render the outcome as tool text.
    #[instrument(skip_all, fields(operation = %origin))]
    pub async fn invoke(
        &self,
        origin: &OperationKey,
        descriptor: &OperationDescriptor,
        arguments: JsonObject,
        context: &CallContext,
    ) -> CallToolResult {
        info!("Invoking {}", origin);
        let outcome = match self.dispatch(origin, descriptor, arguments, context).await {
            Ok(response) => {
                serde_json::to_string_pretty(&response.body.unwrap_or(Value::Null))
                    .map_err(DispatchError::from)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                let classified = e.classify();
                match classified.kind {
                    ErrorKind::User => warn!("{} failed: {}", origin, classified.message),
                    ErrorKind::System => error!("{} failed: {}", origin, classified.message),
                }
                CallToolResult::success(vec![Content::text(classified.to_text())])
            }
        }
    }
}

fn failure_from_response(response: RouteResponse) -> RouteError {
    let field = |name: &str| {
        response
            .body
            .as_ref()
            .and_then(|b| b.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let message = field("message")
        .unwrap_or_else(|| format!("Route returned status {}", response.status));
    let code = field("code").unwrap_or_else(|| "ROUTE_ERROR".to_string());
    RouteError::new(Some(response.status), code, message)
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
