//! Contract-to-tool bridge.
//!
//! A task-management server whose operations are declared once, in a
//! contract registry, and served through two surfaces: a REST API and a set
//! of MCP tools generated from the same contracts.
//!
//! # Architecture
//!
//! - **contracts**: operation descriptors and the contract registry
//! - **core**: configuration, errors, authentication, the composition root,
//!   MCP sessions and transports (STDIO, TCP, HTTP + REST)
//! - **domains**: business logic organized by bounded contexts
//!   - **routes**: the handler registry and task handlers
//!   - **store**: in-memory task storage
//!   - **tools**: tool catalog, registrar and dispatcher
//!
//! # Example
//!
//! ```rust,no_run
//! use contract_tool_bridge::core::{AppContext, Config, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = TransportService::new(config.transport.clone());
//!     let app = AppContext::initialize(config)?;
//!     transport.run(app).await?;
//!     Ok(())
//! }
//! ```

pub mod contracts;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{AppContext, Config, Error, McpServer, Result};
