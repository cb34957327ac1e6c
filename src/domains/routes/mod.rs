//! Routes domain module - the Handler Registry and the business operations.
//!
//! Handlers receive a [`RouteRequest`] that looks the same whether it came
//! from the REST surface or from a tool call, and return a [`RouteResponse`]
//! or a [`RouteError`].
//!
//! - `request.rs` - structured request/response
//! - `error.rs` - handler error
//! - `registry.rs` - handler trait and registry
//! - `tasks.rs` - task handlers

mod error;
mod registry;
mod request;
pub mod tasks;

pub use error::RouteError;
pub use registry::{FnHandler, HandlerRegistry, RouteHandler, RouteResult, handler_fn};
pub use request::{RouteRequest, RouteResponse, lenient};
