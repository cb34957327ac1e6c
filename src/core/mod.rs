//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the server,
//! including configuration, error handling, authentication, the composition
//! root, per-session MCP handling and transport layer abstractions.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use app::AppContext;
pub use auth::{AuthOutcome, Authenticator, CallContext, Principal};
pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
