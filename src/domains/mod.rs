//! Domains module containing business logic organized by bounded contexts.
//!
//! - **routes**: handler registry and the task handlers (REST semantics)
//! - **store**: in-memory task storage behind the handlers
//! - **tools**: MCP tools derived from the contracts and dispatched to routes

pub mod routes;
pub mod store;
pub mod tools;
