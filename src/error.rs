use std::fmt;

use http::Method;

/// Errors raised by route registration, URL generation and dispatch.
///
/// Registration-time variants are fatal: they are returned from the build
/// phase and keep the application from reaching a dispatch-ready state.
/// Dispatch-time variants are converted into structured responses by the
/// [`Dispatcher`](crate::dispatcher::Dispatcher) and never escape as panics.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterError {
    /// A candidate route overlaps an already registered route for a shared method
    RegistrationConflict {
        /// Pattern being registered
        pattern: String,
        /// Pattern of the route it collides with
        existing_pattern: String,
        /// Methods both routes answer to
        methods: Vec<Method>,
        /// Name of the existing route, if it was named
        existing_name: Option<String>,
        /// Group tag of the candidate route
        group_tag: Option<String>,
        /// Group tag of the existing route
        existing_group_tag: Option<String>,
    },
    /// The path template is malformed or compiles to an invalid regex
    InvalidPattern {
        /// Offending template
        pattern: String,
        /// What went wrong
        reason: String,
    },
    /// A route was registered for a verb outside the supported set
    UnsupportedMethod(Method),
    /// Two routes were given the same name
    DuplicateRouteName(String),
    /// `name()` was called before any route was added
    NoRouteToName,
    /// URL generation was asked for a route name that does not exist
    UnknownRouteName(String),
    /// URL generation was missing values for these parameters
    MissingRouteParams {
        /// Route name
        route: String,
        /// Every parameter without a supplied value, in pattern order
        missing: Vec<String>,
    },
    /// A named middleware reference has no factory in the registry
    UnknownMiddleware(String),
    /// A handler reference does not resolve to a controller action
    HandlerNotFound(String),
    /// The action declares a typed parameter the invoker cannot bind
    UnsupportedBinding {
        /// Parameter name
        param: String,
        /// Declared type
        type_name: String,
    },
    /// The action declares the request or response parameter twice
    DuplicateBinding {
        /// Parameter name of the second occurrence
        param: String,
        /// `"request"` or `"response"`
        kind: &'static str,
    },
    /// No route matches the path under any method
    NoMatch(String),
    /// The path matches, but not for the requested method
    MethodMismatch {
        /// Request path
        path: String,
        /// Union of methods the path matches under
        allowed: Vec<Method>,
    },
    /// The route table holds values that cannot be written to a route cache
    NotCacheable(String),
    /// The handler itself returned an error
    Handler(String),
}

impl RouterError {
    /// HTTP status used when the error is turned into a response
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            RouterError::NoMatch(_) | RouterError::UnknownRouteName(_) => 404,
            RouterError::MethodMismatch { .. } => 405,
            RouterError::MissingRouteParams { .. } => 400,
            _ => 500,
        }
    }

    /// Whether this error can only happen while the route table is being built
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            RouterError::RegistrationConflict { .. }
                | RouterError::InvalidPattern { .. }
                | RouterError::UnsupportedMethod(_)
                | RouterError::DuplicateRouteName(_)
                | RouterError::NoRouteToName
                | RouterError::UnknownMiddleware(_)
        )
    }
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::RegistrationConflict {
                pattern,
                existing_pattern,
                methods,
                existing_name,
                group_tag,
                existing_group_tag,
            } => {
                write!(
                    f,
                    "Route '{}' conflicts with existing route '{}' for method(s) {}",
                    pattern,
                    existing_pattern,
                    join_methods(methods)
                )?;
                if let Some(name) = existing_name {
                    write!(f, " (existing route name: {name})")?;
                }
                if let Some(tag) = existing_group_tag {
                    write!(f, " (existing group: {tag})")?;
                }
                if let Some(tag) = group_tag {
                    write!(f, " (group: {tag})")?;
                }
                Ok(())
            }
            RouterError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid route pattern '{pattern}': {reason}")
            }
            RouterError::UnsupportedMethod(method) => {
                write!(f, "HTTP method {method} is not supported by the router")
            }
            RouterError::DuplicateRouteName(name) => {
                write!(f, "Route name '{name}' is already in use")
            }
            RouterError::NoRouteToName => {
                write!(f, "Cannot name a route before any route has been added")
            }
            RouterError::UnknownRouteName(name) => write!(f, "No route named '{name}'"),
            RouterError::MissingRouteParams { route, missing } => write!(
                f,
                "Missing parameters for route '{}': {}",
                route,
                missing.join(", ")
            ),
            RouterError::UnknownMiddleware(name) => {
                write!(f, "Middleware '{name}' is not registered")
            }
            RouterError::HandlerNotFound(reference) => {
                write!(f, "Handler '{reference}' could not be resolved")
            }
            RouterError::UnsupportedBinding { param, type_name } => write!(
                f,
                "Cannot bind parameter '{param}' of type '{type_name}'"
            ),
            RouterError::DuplicateBinding { param, kind } => write!(
                f,
                "Parameter '{param}' binds the {kind} a second time"
            ),
            RouterError::NoMatch(path) => write!(f, "No route matches '/{path}'"),
            RouterError::MethodMismatch { path, allowed } => write!(
                f,
                "Method not allowed for '/{}' (allowed: {})",
                path,
                join_methods(allowed)
            ),
            RouterError::NotCacheable(what) => {
                write!(f, "Route table cannot be cached: {what}")
            }
            RouterError::Handler(message) => write!(f, "Handler failed: {message}"),
        }
    }
}

impl std::error::Error for RouterError {}
