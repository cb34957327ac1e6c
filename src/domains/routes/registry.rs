//! Handler Registry - operation key to business logic.
//!
//! Structurally parallel to the contract registry. [`HandlerRegistry::verify_against`]
//! runs once at startup so a contract entry without a handler fails fast.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use super::error::RouteError;
use super::request::{RouteRequest, RouteResponse};
use crate::contracts::{ContractRegistry, OperationKey};
use crate::core::error::{Error, Result};

/// Outcome of a handler invocation.
pub type RouteResult = std::result::Result<RouteResponse, RouteError>;

/// Executable business operation bound to one operation key.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: RouteRequest) -> RouteResult;
}

/// Adapter turning an async closure into a [`RouteHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult> + Send + 'static,
{
    async fn handle(&self, request: RouteRequest) -> RouteResult {
        (self.0)(request).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteResult> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Mapping from operation key to handler. Never mutated after startup.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<OperationKey, Arc<dyn RouteHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the key.
    pub fn register(&mut self, key: OperationKey, handler: Arc<dyn RouteHandler>) -> &mut Self {
        if self.handlers.insert(key, handler).is_some() {
            warn!("Handler for {} registered twice; keeping the last one", key);
        }
        self
    }

    pub fn get(&self, key: &OperationKey) -> Option<Arc<dyn RouteHandler>> {
        self.handlers.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Fail unless every contract operation has a handler.
    pub fn verify_against(&self, contracts: &ContractRegistry) -> Result<()> {
        let missing: Vec<String> = contracts
            .iter()
            .filter(|(key, _)| !self.handlers.contains_key(key))
            .map(|(key, _)| key.to_string())
            .collect();

        for key in self.handlers.keys() {
            if contracts.get(key).is_none() {
                warn!("Handler registered for {} which has no contract entry", key);
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "No handler registered for: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ContractGroup, HttpMethod, OperationDescriptor};
    use crate::core::auth::{AuthOutcome, CallContext};

    fn contracts() -> ContractRegistry {
        ContractRegistry::new().with_group(
            ContractGroup::new("things")
                .operation("getThing", OperationDescriptor::new(HttpMethod::Get, "/things"))
                .operation("dropThing", OperationDescriptor::new(HttpMethod::Delete, "/things")),
        )
    }

    #[tokio::test]
    async fn test_handler_fn_invocation() {
        let handler = handler_fn(|_req| async { Ok(RouteResponse::no_content()) });
        let request = RouteRequest::new(&CallContext::new(), AuthOutcome::Missing);
        let response = handler.handle(request).await.unwrap();
        assert_eq!(response.status, 204);
    }

    #[test]
    fn test_verify_reports_missing_handlers() {
        let mut registry = HandlerRegistry::new();
        registry.register(
            OperationKey::new("things", "getThing"),
            handler_fn(|_req| async { Ok(RouteResponse::no_content()) }),
        );

        let err = registry.verify_against(&contracts()).unwrap_err();
        assert!(err.to_string().contains("things.dropThing"));
        assert!(!err.to_string().contains("things.getThing"));

        registry.register(
            OperationKey::new("things", "dropThing"),
            handler_fn(|_req| async { Ok(RouteResponse::no_content()) }),
        );
        assert!(registry.verify_against(&contracts()).is_ok());
        assert_eq!(registry.len(), 2);
    }
}
