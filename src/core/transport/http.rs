//! HTTP transport implementation.
//!
//! One axum server carries both invocation surfaces:
//!
//! - MCP JSON-RPC over POST (`/mcp` by default), a fresh session per request
//!   built from that request's headers
//! - the REST routes derived from the contracts (see [`super::rest`])
//! - `/health`, `/mcp-info`, `/openapi.json` and `/`

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig, rest};
use crate::core::{AppContext, CallContext, McpServer};
use crate::domains::tools::ToolError;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// State shared across HTTP handlers.
#[derive(Clone)]
struct HttpState {
    app: Arc<AppContext>,
    rpc_path: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, app: Arc<AppContext>) -> TransportResult<()> {
        let addr = self.address();
        let router = router(app, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        if self.config.serve_rest {
            info!("  → REST:     /tasks (Basic auth)");
        }
        info!("  → Health:   GET /health");

        axum::serve(listener, router)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the full HTTP router.
pub fn router(app: Arc<AppContext>, config: &HttpConfig) -> Router {
    let state = HttpState {
        app: app.clone(),
        rpc_path: config.rpc_path.clone(),
    };

    let mut router = Router::new()
        .route(&config.rpc_path, post(handle_rpc))
        .route("/health", get(health_check))
        .route("/mcp-info", get(mcp_info))
        .route("/openapi.json", get(openapi))
        .route("/", get(root_handler))
        .with_state(state);

    if config.serve_rest {
        router = router.merge(rest::router(&app));
    }

    router = router.layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let server = &state.app.config().server;
    Json(serde_json::json!({
        "name": server.name,
        "version": server.version,
        "transport": "HTTP",
        "endpoints": {
            "rpc": state.rpc_path,
            "health": "/health",
            "mcpInfo": "/mcp-info",
            "openapi": "/openapi.json"
        },
        "protocol": "JSON-RPC 2.0",
        "documentation": format!("Send POST requests to {} with JSON-RPC messages", state.rpc_path)
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Describes the MCP endpoint and the tools it exposes.
async fn mcp_info(State(state): State<HttpState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "endpoint": format!("POST {}", state.rpc_path),
        "transport": "JSON-RPC over HTTP",
        "description": "Every operation marked as a tool in the contracts is exposed automatically",
        "tools": state.app.catalog().names(),
    }))
}

/// OpenAPI document generated from the contracts.
async fn openapi(State(state): State<HttpState>) -> impl IntoResponse {
    let server = &state.app.config().server;
    Json(rest::openapi_document(
        state.app.contracts(),
        &server.name,
        &server.version,
    ))
}

/// Handle JSON-RPC requests.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::Span::current().record("method", request.method.as_str());
    info!("Received JSON-RPC request: {}", request.method);

    if request.method.starts_with("notifications/") {
        info!("Received notification: {}", request.method);
        return StatusCode::ACCEPTED.into_response();
    }

    let context = CallContext::from_header_map(&headers);
    let session = McpServer::for_request(state.app.clone(), context);
    let response = process_request(&session, request).await;

    (StatusCode::OK, Json(response)).into_response()
}

/// Process a JSON-RPC request within one session.
async fn process_request(session: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::invalid_request(request.id);
    }

    match request.method.as_str() {
        "initialize" => handle_initialize(session, request),
        "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
        "tools/list" => handle_tools_list(session, request),
        "tools/call" => handle_tools_call(session, request).await,
        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    }
}

/// Handle initialize request.
fn handle_initialize(session: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let result = serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": session.name(),
            "version": session.version()
        },
        "instructions": session.instructions()
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
fn handle_tools_list(session: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/list request");

    let result = serde_json::json!({
        "tools": session.list_tools()
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/call request.
async fn handle_tools_call(session: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/call request");

    let params = match request.params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(request.id.clone(), "Missing params"),
    };

    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n.to_string(),
        None => return JsonRpcResponse::invalid_params(request.id.clone(), "Missing tool name"),
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    match session.call_tool(&name, arguments).await {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e @ (ToolError::NotFound(_) | ToolError::InvalidArguments(_))) => {
            JsonRpcResponse::invalid_params(request.id, e.to_string())
        }
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::basic_authorization;
    use crate::core::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let app = AppContext::initialize(Config::default()).unwrap();
        router(app, &HttpConfig::default())
    }

    fn rpc(body: Value, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn tool_text(response: &Value) -> &str {
        response["result"]["content"][0]["text"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(rpc(
                json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
                None,
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(
            body["result"]["instructions"]
                .as_str()
                .unwrap()
                .contains("tasks_list_tasks")
        );

        let response = router
            .oneshot(rpc(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_tools_call_uses_request_headers() {
        let router = test_router();
        let call = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "tasks_create_task",
                "arguments": { "title": "Buy coffee", "priority": "high" }
            }
        });

        let response = router.clone().oneshot(rpc(call.clone(), None)).await.unwrap();
        let body = json_body(response).await;
        assert!(tool_text(&body).starts_with("❌ Error [USER]:"));

        let auth = basic_authorization("demo", "demo123");
        let response = router.oneshot(rpc(call, Some(&auth))).await.unwrap();
        let body = json_body(response).await;
        let task: Value = serde_json::from_str(tool_text(&body)).unwrap();
        assert_eq!(task["title"], "Buy coffee");
        assert_eq!(task["status"], "pending");
    }

    #[tokio::test]
    async fn test_rpc_errors() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(rpc(json!({ "jsonrpc": "2.0", "id": 4, "method": "nope" }), None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["error"]["code"], -32601);

        let response = router
            .clone()
            .oneshot(rpc(
                json!({ "jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": { "name": "missing" } }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["error"]["code"], -32602);

        let response = router
            .oneshot(rpc(
                json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_info_endpoints() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["status"], "ok");

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/mcp-info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["tools"].as_array().unwrap().len(), 6);

        let response = router
            .oneshot(Request::builder().uri("/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let doc = json_body(response).await;
        assert_eq!(doc["openapi"], "3.0.3");
        assert!(doc["paths"]["/tasks/{id}"]["patch"].is_object());
    }
}
