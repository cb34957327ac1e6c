//! Tools domain module.
//!
//! Exposes contract operations as MCP tools. Nothing here is written per
//! operation: tools are derived from the contract registry and every call is
//! routed back to the same handlers the REST surface uses.
//!
//! ## Architecture
//!
//! - `catalog.rs` - discovers tool definitions from the contract registry
//! - `registrar.rs` - registers definitions with a tool runtime
//! - `dispatcher.rs` - reclassifies arguments and invokes route handlers
//! - `error.rs` - tool error types and USER/SYSTEM classification
//!
//! ## Adding a New Tool
//!
//! 1. Declare the operation in a contract group with `ToolMetadata::exposed`
//! 2. Register its handler in `domains::routes`
//!
//! **No need to modify anything here!** The catalog is rebuilt from the
//! contracts at startup.

mod catalog;
mod dispatcher;
mod error;
mod registrar;

pub use catalog::{ToolCatalog, ToolDefinition, tool_name};
pub use dispatcher::{DispatchError, Dispatcher, ParamBuckets, reclassify};
pub(crate) use dispatcher::panic_message;
pub use error::{ClassifiedError, ERROR_MARKER, ErrorKind, ToolError};
pub use registrar::{RouterRuntime, ToolCallback, ToolRegistrar, ToolRuntime, ToolTable};
