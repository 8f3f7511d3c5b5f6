//! # Dispatcher Module
//!
//! The dispatcher turns a finished [`Router`](crate::router::Router) into a
//! request handler. It resolves every route's handler and middleware once, at
//! build time, and then dispatches requests synchronously.
//!
//! ## Request Flow
//!
//! 1. The request id is taken from `X-Request-Id` or generated (ULID)
//! 2. The path is split from the query string and trimmed of separators
//! 3. A POST may carry an override verb (`PUT`, `PATCH` or `DELETE`) in the
//!    `X-HTTP-Method-Override` header or the `_method` form field
//! 4. Routes are scanned in registration order for the literal method, then
//!    for the override verb
//! 5. On a match, converted path parameters and route metadata are attached to
//!    the request and the route's pipeline runs around its handler
//! 6. Otherwise the global pipeline runs around a 405 (path known under other
//!    methods, with an `Allow` header) or the fallback hook / 404
//!
//! The final response is also kept as the dispatcher's last response.
//!
//! ## Example
//!
//! ```rust
//! use railyard::dispatcher::{Dispatcher, HandlerResponse};
//! use railyard::handler::Action;
//! use railyard::router::Router;
//!
//! # fn main() -> Result<(), railyard::RouterError> {
//! let mut router = Router::new();
//! router.get(
//!     "ping",
//!     Action::from_request_fn(|_req| HandlerResponse::ok("pong")),
//! )?;
//!
//! let dispatcher = Dispatcher::builder(router).build()?;
//! let res = dispatcher.dispatch_uri("/ping?x=1");
//! assert_eq!(res.body, "pong");
//! assert_eq!(dispatcher.last_status(), Some(200));
//! # Ok(())
//! # }
//! ```

mod core;
mod request;
mod response;

pub use core::{override_verb, Dispatcher, DispatcherBuilder, Fallback};
pub use request::{parse_query, split_uri, HandlerRequest, HeaderVec, RequestId, MAX_INLINE_HEADERS};
pub use response::HandlerResponse;
