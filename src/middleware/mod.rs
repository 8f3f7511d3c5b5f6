//! # Middleware Module
//!
//! Middleware wraps route handlers in "onion" order. A unit has the shape
//! `(request, response, next) -> response`; see [`Middleware`].
//!
//! For a route the pipeline is `global ++ group ++ route`: global middleware
//! runs first on the way in and last on the way out, group middleware sits
//! inside it, and route middleware wraps the handler directly. Any unit that
//! returns without calling `next` short-circuits the rest of the chain, which
//! is how authentication gates and CORS preflight answers work.
//!
//! Routes refer to middleware through [`MiddlewareRef`]s: either an inline
//! instance or a name looked up in a [`MiddlewareRegistry`]. Names are
//! resolved once, when the dispatcher is built, so an unknown name fails at
//! startup rather than on the first request.
//!
//! ## Built-in middleware
//!
//! | name             | type                  |
//! |------------------|-----------------------|
//! | `error_boundary` | [`ErrorBoundary`]     |
//! | `cors`           | [`CorsMiddleware`]    |
//! | `tracing`        | [`TracingMiddleware`] |
//! | `metrics`        | [`MetricsMiddleware`] |
//!
//! [`AuthMiddleware`] needs a token and is registered by the application.

mod auth;
mod core;
mod cors;
mod error_boundary;
mod metrics;
mod pipeline;
mod registry;
mod tracing;

pub use auth::AuthMiddleware;
pub use core::{from_fn, FnMiddleware, Middleware, Next};
pub use cors::CorsMiddleware;
pub use error_boundary::ErrorBoundary;
pub use metrics::MetricsMiddleware;
pub use pipeline::Pipeline;
pub use registry::{MiddlewareFactory, MiddlewareRef, MiddlewareRegistry};
pub(crate) use registry::Resolver;
