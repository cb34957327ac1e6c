//! REST surface - axum routes generated from the contract registry.
//!
//! One route per descriptor method and path. Path, query and body are
//! extracted into a [`RouteRequest`], authenticated with the same
//! authenticator as the tool surface, and handed to the same handler
//! registry. Failures are classified exactly like tool failures and
//! returned as `{code, message}` with the classified status.

use axum::{
    Json, Router,
    extract::{
        Path, Query,
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter, on},
};
use bytes::Bytes;
use futures::FutureExt;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, warn};

use crate::contracts::{
    ContractRegistry, FieldSchema, HttpMethod, OperationDescriptor, OperationKey,
};
use crate::core::AppContext;
use crate::core::auth::{Authenticator, CallContext};
use crate::domains::routes::{HandlerRegistry, RouteError, RouteRequest, RouteResponse};
use crate::domains::tools::{ClassifiedError, ErrorKind, panic_message};

/// Everything one REST route needs to serve a request.
#[derive(Clone)]
struct RestEndpoint {
    key: OperationKey,
    descriptor: Arc<OperationDescriptor>,
    handlers: Arc<HandlerRegistry>,
    authenticator: Authenticator,
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
    }
}

/// Build the REST router for every operation in the registry.
pub fn router(app: &AppContext) -> Router {
    let mut by_path: Vec<(&'static str, MethodRouter)> = Vec::new();

    for (key, descriptor) in app.contracts().iter() {
        let endpoint = RestEndpoint {
            key,
            descriptor: descriptor.clone(),
            handlers: app.handlers().clone(),
            authenticator: app.authenticator().clone(),
        };
        let handler = move |headers: HeaderMap,
                            path: Result<Path<HashMap<String, String>>, PathRejection>,
                            query: Result<Query<HashMap<String, String>>, QueryRejection>,
                            body: Bytes| {
            let endpoint = endpoint.clone();
            async move { endpoint.serve(headers, path, query, body).await }
        };

        let filter = method_filter(descriptor.method);
        match by_path.iter_mut().find(|(path, _)| *path == descriptor.path) {
            Some((_, methods)) => {
                let existing = std::mem::replace(methods, MethodRouter::new());
                *methods = existing.on(filter, handler);
            }
            None => by_path.push((descriptor.path, on(filter, handler))),
        }
    }

    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, methods)| {
            router.route(path, methods)
        })
}

impl RestEndpoint {
    async fn serve(
        self,
        headers: HeaderMap,
        path: Result<Path<HashMap<String, String>>, PathRejection>,
        query: Result<Query<HashMap<String, String>>, QueryRejection>,
        body: Bytes,
    ) -> Response {
        let query = match query {
            Ok(Query(query)) => query,
            Err(rejection) => return rejected_query(&rejection),
        };

        let context = CallContext::from_header_map(&headers);
        let auth = self.authenticator.authenticate(&context);
        let mut request = RouteRequest::new(&context, auth);

        request.params = strings_to_object(path.map(|Path(p)| p).unwrap_or_default());
        request.query = strings_to_object(query);
        if !body.is_empty() {
            match serde_json::from_slice::<Value>(&body) {
                Ok(Value::Object(map)) => request.body = Some(map),
                Ok(_) => {
                    return error_response(&RouteError::validation(
                        "Request body must be a JSON object",
                    ));
                }
                Err(e) => {
                    return error_response(&RouteError::validation(format!(
                        "Invalid JSON body: {e}"
                    )));
                }
            }
        }

        let Some(handler) = self.handlers.get(&self.key) else {
            return error_response(&RouteError::internal(format!(
                "Route not found: {}",
                self.key
            )));
        };

        let outcome = AssertUnwindSafe(handler.handle(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(RouteError::internal(format!(
                    "Route execution failed: {}",
                    panic_message(panic.as_ref())
                )))
            });

        match outcome {
            Ok(response) => {
                if !self.descriptor.declares_status(response.status) {
                    warn!("{} returned undeclared status {}", self.key, response.status);
                }
                success_response(response)
            }
            Err(e) => error_response(&e),
        }
    }
}

fn strings_to_object(values: HashMap<String, String>) -> Map<String, Value> {
    values
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}

fn rejected_query(rejection: &QueryRejection) -> Response {
    error_response(&RouteError::validation(format!(
        "Invalid query string: {}",
        rejection.body_text()
    )))
}

fn success_response(response: RouteResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    match response.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

fn error_response(err: &RouteError) -> Response {
    let classified = ClassifiedError::from(err);
    match classified.kind {
        ErrorKind::User => warn!("REST request failed: {}", classified.message),
        ErrorKind::System => error!("REST request failed: {}", classified.message),
    }
    let status =
        StatusCode::from_u16(classified.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_body())).into_response()
}

// ============================================================================
// OpenAPI
// ============================================================================

fn parameter(field: &FieldSchema, location: &str) -> Value {
    let mut param = json!({
        "name": field.name,
        "in": location,
        "required": field.required || location == "path",
        "schema": field.to_json_schema(),
    });
    if let Some(description) = field.description {
        param["description"] = json!(description);
    }
    param
}

/// Minimal OpenAPI 3 document describing every operation.
pub fn openapi_document(contracts: &ContractRegistry, title: &str, version: &str) -> Value {
    let mut paths = Map::new();

    for (key, descriptor) in contracts.iter() {
        let mut parameters: Vec<Value> = descriptor
            .path_params
            .iter()
            .map(|f| parameter(f, "path"))
            .collect();
        parameters.extend(descriptor.query.iter().map(|f| parameter(f, "query")));

        let mut responses = Map::new();
        for (status, response) in &descriptor.responses {
            let mut entry = json!({ "description": response.description });
            if let Some(schema) = response.schema {
                let schema = Value::Object(schema().as_ref().clone());
                entry["content"] = json!({ "application/json": { "schema": schema } });
            }
            responses.insert(status.to_string(), entry);
        }

        let mut operation = json!({
            "operationId": format!("{}{}", key.group, capitalize(key.operation)),
            "tags": [key.group],
            "parameters": parameters,
            "responses": responses,
        });
        if let Some(summary) = descriptor.summary {
            operation["summary"] = json!(summary);
        }
        if let Some(description) = descriptor.description {
            operation["description"] = json!(description);
        }
        if !descriptor.body.is_empty() {
            let properties: Map<String, Value> = descriptor
                .body
                .iter()
                .map(|f| (f.name.to_string(), f.to_json_schema()))
                .collect();
            let required: Vec<&str> = descriptor
                .body
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name)
                .collect();
            operation["requestBody"] = json!({
                "content": { "application/json": { "schema": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }}}
            });
        }

        let method = descriptor.method.as_str().to_lowercase();
        let entry = paths
            .entry(descriptor.path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(method, operation);
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": { "title": title, "version": version },
        "components": { "securitySchemes": { "basicAuth": { "type": "http", "scheme": "basic" } } },
        "security": [{ "basicAuth": [] }],
        "paths": paths,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
