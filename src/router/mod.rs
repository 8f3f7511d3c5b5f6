//! # Router Module
//!
//! Path matching and reverse routing for Railyard.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling path templates such as `users/{id:int}` into anchored regexes
//! - Rejecting routes that collide with an existing route at registration
//! - Matching request paths and methods to routes in registration order
//! - Converting captured parameters through named constraints
//! - Building URLs from route names and parameters
//!
//! ## Architecture
//!
//! Routing happens in two phases:
//!
//! 1. **Registration**: each template is compiled against the
//!    [`ConstraintRegistry`]. Every parameter becomes a named capture group
//!    whose fragment comes from its constraint (or `[^/]+` when untyped). The
//!    resulting [`CompiledRoute`] is checked for collisions and appended to the
//!    [`RouteTable`].
//!
//! 2. **Matching**: a request path is trimmed of its separators and tested
//!    against each route answering the request method. The first hit wins.
//!    Captured values are converted with the converter registered for their
//!    type *at match time*, so converters can be registered after routes.
//!
//! ## Built-in constraints
//!
//! | type      | matches                          | converts to          |
//! |-----------|----------------------------------|----------------------|
//! | `int`     | ASCII digits                     | integer              |
//! | `numeric` | digits with optional fraction    | float                |
//! | `bool`    | true/false/1/0/yes/no/on/off     | boolean              |
//! | `slug`    | letters, digits, `-`, `%XX`      | percent-decoded text |
//! | `alpha`   | letters, `%XX`                   | percent-decoded text |
//! | `alnum`   | letters, digits, `%XX`           | percent-decoded text |
//! | `uuid`    | 8-4-4-4-12 hex, any case         | lowercase text       |
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use railyard::router::{DispatchOutcome, GroupOptions, Router};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), railyard::RouterError> {
//! let mut router = Router::new();
//! router.group(GroupOptions::prefix("api"), |r| {
//!     r.get("users/{id:int}", "UserController@show")?.name("users.show")
//! })?;
//!
//! match router.resolve(&Method::GET, "/api/users/042", None) {
//!     DispatchOutcome::Matched(m) => assert_eq!(m.get_path_param("id"), Some(&json!(42))),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//!
//! let url = router.url("users.show", &[("id", json!(7))], &[], None)?;
//! assert_eq!(url, "/api/users/7");
//! # Ok(())
//! # }
//! ```

mod collision;
mod constraints;
mod core;
mod pattern;
mod table;
mod url;

pub use collision::detect_collision;
pub use constraints::{ConstraintRegistry, ConstraintSpec, Converter, DEFAULT_FRAGMENT};
pub use core::{
    DispatchOutcome, GroupOptions, ParamVec, RouteHandle, RouteMatch, Router, MAX_INLINE_PARAMS,
    OVERRIDE_METHODS, SUPPORTED_METHODS,
};
pub use pattern::{compile_pattern, trim_separators, CompiledPattern};
pub use table::{CompiledRoute, RouteTable};
pub use url::UrlContext;

pub(crate) use pattern::anchored;
