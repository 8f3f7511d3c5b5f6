//! # Handler Module
//!
//! Handlers are referenced from routes in one of three ways:
//!
//! - a direct [`Action`] value,
//! - a `(controller, action)` pair,
//! - a `"Controller@action"` string.
//!
//! The last two are resolved through a [`ControllerRegistry`] when the
//! dispatcher is built.
//!
//! ## Argument binding
//!
//! Every action carries a [`Signature`]. From it a [`Descriptor`] is computed
//! once, when the action is created, describing where each call argument comes
//! from:
//!
//! | declared kind | bound to |
//! |---------------|----------|
//! | `Request`     | the current request (at most once) |
//! | `Response`    | the response so far (at most once) |
//! | `Value`       | next route parameter, else default, else `null` |
//! | `Object(_)`   | rejected with `UnsupportedBinding` |
//!
//! A signature that cannot be bound still registers; each invocation then
//! fails with the binding error, which the dispatcher turns into a 500
//! response. [`Signature::Opaque`] skips binding entirely and passes the route
//! parameters positionally.
//!
//! ```rust
//! use railyard::dispatcher::HandlerResponse;
//! use railyard::handler::{Action, ParamDecl, Signature};
//!
//! let show = Action::new(
//!     Signature::declared(vec![ParamDecl::request("req"), ParamDecl::value("id")]),
//!     |args| Ok(HandlerResponse::ok(format!("user {}", args.value(0)))),
//! );
//! assert!(show.descriptor().is_ok());
//! ```

mod action;
mod controller;
mod invoker;

pub use action::{Action, Arg, ArgSource, Args, Descriptor, ParamDecl, ParamKind, Signature};
pub use controller::{Controller, ControllerRegistry, HandlerRef, DEFAULT_ACTION};
