//! Contracts module - the single declarative description of every operation.
//!
//! Both invocation surfaces (REST and MCP tools) are derived from the
//! [`ContractRegistry`] built here at startup:
//!
//! - `descriptor.rs` - operation keys, parameter schemas, responses, tool metadata
//! - `registry.rs` - ordered group/operation registry
//! - `tasks.rs` - the task operations and their models

pub mod descriptor;
pub mod registry;
pub mod tasks;

pub use descriptor::{
    FieldKind, FieldSchema, HttpMethod, OperationDescriptor, OperationKey, ParamLocation,
    ResponseSchema, ToolMetadata,
};
pub use registry::{ContractGroup, ContractRegistry};

/// The contract registry served by this application.
pub fn default_contracts() -> ContractRegistry {
    ContractRegistry::new().with_group(tasks::contract())
}
