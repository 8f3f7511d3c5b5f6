//! # Railyard
//!
//! **Railyard** is the routing and dispatch core of a web framework: a
//! regex-compiled route table with typed path constraints, registration-time
//! collision detection, method override, onion-style middleware, explicit
//! handler argument binding and reverse URL generation.
//!
//! ## Architecture
//!
//! The library is organized into these modules:
//!
//! - **[`router`]** - Constraint registry, pattern compiler, collision
//!   detector, route table, matcher and URL generator
//! - **[`middleware`]** - Middleware trait, name registry, pipeline composer
//!   and built-in middleware (error boundary, CORS, tracing, metrics, auth)
//! - **[`handler`]** - Actions, controllers and argument binding
//! - **[`dispatcher`]** - Request/response types and the per-request dispatch
//!   flow
//! - **[`manifest`]** - YAML route manifests
//! - **[`cache`]** - Route table export/import
//! - **[`config`]** / **[`logging`]** - Runtime configuration and tracing setup
//! - **[`cli`]** - The `railyard` command-line tool
//!
//! ### Request Handling Flow
//!
//! ```text
//! HandlerRequest
//!   -> split path / query, trim separators
//!   -> method override (POST + header or form field)
//!   -> Router::resolve (registration order, literal method, then override)
//!   -> Matched:        global ++ group ++ route middleware -> action
//!      MethodMismatch: global middleware -> 405 + Allow
//!      NoMatch:        global middleware -> fallback hook or 404
//!   -> HandlerResponse (also kept as the last response)
//! ```
//!
//! ### Lifecycle
//!
//! Building and dispatching are separate phases. Routes, groups, names and
//! constraints are registered through `&mut Router`; any registration error
//! is returned immediately. The finished router is handed to
//! [`Dispatcher::builder`](dispatcher::Dispatcher::builder), which resolves
//! every controller and middleware reference up front. From then on the
//! route table is read-only.
//!
//! ## Quick Start
//!
//! ```rust
//! use railyard::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
//! use railyard::handler::{Action, Controller, ControllerRegistry, ParamDecl, Signature};
//! use railyard::router::{GroupOptions, Router};
//!
//! # fn main() -> Result<(), railyard::RouterError> {
//! let show = Action::new(
//!     Signature::declared(vec![ParamDecl::value("id")]),
//!     |args| Ok(HandlerResponse::ok(format!("user {}", args.value(0)))),
//! );
//! let controllers = ControllerRegistry::new()
//!     .with(Controller::new("UserController").action("show", show));
//!
//! let mut router = Router::new();
//! router.group(GroupOptions::prefix("api").middleware("error_boundary"), |r| {
//!     r.get("users/{id:int}", "UserController@show")?.name("users.show")
//! })?;
//!
//! let dispatcher = Dispatcher::builder(router).controllers(controllers).build()?;
//! let res = dispatcher.dispatch(HandlerRequest::get("/api/users/042"));
//! assert_eq!(res.body, "user 42");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod logging;
pub mod manifest;
pub mod middleware;
pub mod router;

pub use config::RouterConfig;
pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
pub use error::RouterError;
pub use router::{DispatchOutcome, Router};
