//! Application context - the composition root.
//!
//! Builds everything that is shared across sessions exactly once at startup:
//! contracts, the task store, handlers, the tool catalog and dispatcher.
//! Every transport receives the same `Arc<AppContext>`.

use std::sync::Arc;
use tracing::info;

use super::auth::{Authenticator, CallContext};
use super::config::Config;
use super::error::Result;
use crate::contracts::{ContractRegistry, default_contracts};
use crate::domains::routes::{HandlerRegistry, tasks};
use crate::domains::store::TaskStore;
use crate::domains::tools::{Dispatcher, ToolCatalog, ToolRegistrar};

/// Shared, immutable application state.
pub struct AppContext {
    config: Arc<Config>,
    contracts: Arc<ContractRegistry>,
    handlers: Arc<HandlerRegistry>,
    authenticator: Authenticator,
    registrar: ToolRegistrar,
}

impl AppContext {
    /// Build the default application: task contracts backed by a seeded store.
    pub fn initialize(config: Config) -> Result<Arc<Self>> {
        let store = Arc::new(TaskStore::seeded());
        let mut handlers = HandlerRegistry::new();
        tasks::register(&mut handlers, store);
        Self::from_parts(config, default_contracts(), handlers)
    }

    /// Assemble from explicit parts, failing fast on an inconsistent setup.
    pub fn from_parts(
        config: Config,
        contracts: ContractRegistry,
        handlers: HandlerRegistry,
    ) -> Result<Arc<Self>> {
        contracts.validate()?;
        handlers.verify_against(&contracts)?;
        info!(
            "Loaded {} operations with {} handlers",
            contracts.len(),
            handlers.len()
        );

        let authenticator = Authenticator::new(&config.auth);
        let handlers = Arc::new(handlers);
        let catalog = Arc::new(ToolCatalog::discover(&contracts));
        let dispatcher = Arc::new(Dispatcher::new(handlers.clone(), authenticator.clone()));

        Ok(Arc::new(Self {
            config: Arc::new(config),
            contracts: Arc::new(contracts),
            handlers,
            authenticator,
            registrar: ToolRegistrar::new(catalog, dispatcher),
        }))
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn contracts(&self) -> &Arc<ContractRegistry> {
        &self.contracts
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn registrar(&self) -> &ToolRegistrar {
        &self.registrar
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        self.registrar.catalog()
    }

    /// Call context for sessions without per-request headers (STDIO, TCP).
    pub fn session_context(&self) -> CallContext {
        CallContext::with_authorization(self.config.auth.session_authorization.as_deref())
    }
}
