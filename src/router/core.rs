//! Router core: registration surface and the path+method matcher.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, info};

use super::collision::detect_collision;
use super::constraints::ConstraintRegistry;
use super::pattern::{anchored, compile_pattern, trim_separators};
use super::table::{CompiledRoute, RouteTable};
use crate::error::RouterError;
use crate::handler::HandlerRef;
use crate::middleware::MiddlewareRef;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Converted path parameters, in pattern order.
pub type ParamVec = SmallVec<[(Arc<str>, Value); MAX_INLINE_PARAMS]>;

/// Verbs a route can be registered for
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Verbs a POST request may override itself to
pub const OVERRIDE_METHODS: [Method; 3] = [Method::PUT, Method::PATCH, Method::DELETE];

/// A successful match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<CompiledRoute>,
    /// Position of the route in the table
    pub index: usize,
    /// Method the route matched under
    pub method: Method,
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&Value> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Convert path_params to a HashMap. Allocates.
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, Value> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Result of matching a path and method against the table.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Matched(RouteMatch),
    NoMatch,
    /// The path matched, but only under these methods
    MethodMismatch(Vec<Method>),
}

/// Options for [`Router::group`].
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub prefix: String,
    pub middleware: Vec<MiddlewareRef>,
    pub tag: Option<String>,
}

impl GroupOptions {
    #[must_use]
    pub fn prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }
}

/// Scope active while a group block runs
#[derive(Debug, Clone, Default)]
struct GroupContext {
    prefix: String,
    middleware: Vec<MiddlewareRef>,
    tag: Option<String>,
}

/// Join template pieces with single separators.
pub(crate) fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = trim_separators(prefix);
    let path = trim_separators(path);
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{path}"),
    }
}

/// Route table plus the registration surface.
///
/// The router is built through `&mut self` during startup and then shared
/// read-only (typically inside a [`Dispatcher`](crate::dispatcher::Dispatcher)).
#[derive(Debug, Clone, Default)]
pub struct Router {
    table: RouteTable,
    constraints: ConstraintRegistry,
    global_middleware: Vec<MiddlewareRef>,
    groups: Vec<GroupContext>,
    last_added: Option<usize>,
}

/// Handle to the route just added, used to name it.
#[derive(Debug)]
pub struct RouteHandle<'a> {
    router: &'a mut Router,
    index: usize,
}

impl RouteHandle<'_> {
    /// Name this route
    pub fn name(self, name: &str) -> Result<(), RouterError> {
        self.router.table.assign_name(self.index, name)
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router using a prepared constraint registry
    #[must_use]
    pub fn with_constraints(constraints: ConstraintRegistry) -> Self {
        Self {
            constraints,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn constraints(&self) -> &ConstraintRegistry {
        &self.constraints
    }

    /// Constraints registered here affect routes added afterwards (regex
    /// fragments) and every route's conversions (converters).
    pub fn constraints_mut(&mut self) -> &mut ConstraintRegistry {
        &mut self.constraints
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Replace the middleware applied to every route
    pub fn set_global_middleware(&mut self, middleware: Vec<MiddlewareRef>) {
        self.global_middleware = middleware;
    }

    #[must_use]
    pub fn global_middleware(&self) -> &[MiddlewareRef] {
        &self.global_middleware
    }

    /// Register a route.
    ///
    /// The pattern is joined onto the prefixes of any enclosing groups and the
    /// group middleware is placed in front of `middleware`. Fails if the route
    /// collides with an existing one.
    pub fn add(
        &mut self,
        methods: &[Method],
        pattern: &str,
        handler: impl Into<HandlerRef>,
        middleware: Vec<MiddlewareRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.last_added = None;
        let methods = normalize_methods(methods, pattern)?;
        let scope = self.groups.last().cloned().unwrap_or_default();

        let full_pattern = join_paths(&scope.prefix, pattern);
        let compiled = compile_pattern(&full_pattern, &self.constraints)?;
        let regex = anchored(&compiled.source, &full_pattern)?;

        let mut stack = scope.middleware;
        stack.extend(middleware);

        let route = CompiledRoute::new(
            methods,
            full_pattern,
            compiled,
            regex,
            handler.into(),
            stack,
            scope.tag,
        )?;
        detect_collision(&self.table, &route)?;

        info!(
            methods = ?route.methods,
            pattern = %route.pattern,
            handler = %route.handler.label(),
            params = ?route.param_names,
            group = ?route.group_tag,
            "Route registered"
        );

        let index = self.table.push(route)?;
        self.last_added = Some(index);
        Ok(RouteHandle {
            router: self,
            index,
        })
    }

    pub fn get(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.add(&[Method::GET], pattern, handler, Vec::new())
    }

    pub fn post(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.add(&[Method::POST], pattern, handler, Vec::new())
    }

    pub fn put(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.add(&[Method::PUT], pattern, handler, Vec::new())
    }

    pub fn patch(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.add(&[Method::PATCH], pattern, handler, Vec::new())
    }

    pub fn delete(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.add(&[Method::DELETE], pattern, handler, Vec::new())
    }

    /// Register for every supported verb
    pub fn any(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<RouteHandle<'_>, RouterError> {
        self.add(&SUPPORTED_METHODS, pattern, handler, Vec::new())
    }

    /// Run `block` with a prefix/middleware/tag scope.
    ///
    /// Groups nest: prefixes concatenate, middleware accumulates outer group
    /// first, and the innermost tag wins. The scope is popped even when the
    /// block fails.
    pub fn group<F>(&mut self, options: GroupOptions, block: F) -> Result<(), RouterError>
    where
        F: FnOnce(&mut Router) -> Result<(), RouterError>,
    {
        let parent = self.groups.last().cloned().unwrap_or_default();
        let mut middleware = parent.middleware;
        middleware.extend(options.middleware);
        self.groups.push(GroupContext {
            prefix: join_paths(&parent.prefix, &options.prefix),
            middleware,
            tag: options.tag.or(parent.tag),
        });

        let result = block(self);
        self.groups.pop();
        result
    }

    /// Name the most recently added route
    pub fn name(&mut self, name: &str) -> Result<(), RouterError> {
        let index = self.last_added.ok_or(RouterError::NoRouteToName)?;
        self.table.assign_name(index, name)
    }

    /// Add an already compiled route without collision checks (route cache import)
    pub(crate) fn push_trusted(&mut self, route: CompiledRoute) -> Result<usize, RouterError> {
        self.last_added = None;
        let index = self.table.push(route)?;
        self.last_added = Some(index);
        Ok(index)
    }

    /// First route, in registration order, matching `method` and `path`.
    ///
    /// `path` must already have its query string removed.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let path = trim_separators(path);
        self.table
            .iter()
            .enumerate()
            .filter(|(_, route)| route.answers(method))
            .find_map(|(index, route)| {
                let caps = route.regex.captures(path)?;
                let path_params = route
                    .param_names
                    .iter()
                    .zip(&route.param_types)
                    .zip(&route.param_groups)
                    .map(|((name, type_name), group)| {
                        let raw = caps.get(*group).map_or("", |m| m.as_str());
                        (Arc::clone(name), self.constraints.convert(type_name, raw))
                    })
                    .collect();
                Some(RouteMatch {
                    route: Arc::clone(route),
                    index,
                    method: method.clone(),
                    path_params,
                })
            })
    }

    /// Union of methods under which some route matches `path`
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let path = trim_separators(path);
        let mut allowed: Vec<Method> = Vec::new();
        for route in self.table.iter().filter(|r| r.regex.is_match(path)) {
            for method in &route.methods {
                if !allowed.contains(method) {
                    allowed.push(method.clone());
                }
            }
        }
        allowed.sort_by_key(|m| SUPPORTED_METHODS.iter().position(|s| s == m));
        allowed
    }

    /// Match a request path.
    ///
    /// The literal method is tried first; if nothing matches and an override
    /// method is given, the scan is repeated for it. Otherwise the path is
    /// checked under every method to tell a 405 from a 404.
    #[must_use]
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
        override_method: Option<&Method>,
    ) -> DispatchOutcome {
        let path = trim_separators(path);
        debug!(method = %method, path = %path, override_method = ?override_method, "Route match attempt");

        if let Some(m) = self.find(method, path) {
            return DispatchOutcome::Matched(m);
        }
        if let Some(over) = override_method {
            if let Some(m) = self.find(over, path) {
                debug!(method = %method, effective = %over, path = %path, "Matched through method override");
                return DispatchOutcome::Matched(m);
            }
        }

        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            DispatchOutcome::NoMatch
        } else {
            DispatchOutcome::MethodMismatch(allowed)
        }
    }

    /// Write the route listing, one route per line with its middleware
    pub fn write_routes(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{} routes", self.table.len())?;
        if !self.global_middleware.is_empty() {
            let names: Vec<&str> = self.global_middleware.iter().map(|m| m.label()).collect();
            writeln!(out, "global middleware: {}", names.join(", "))?;
        }
        for route in self.table.iter() {
            write!(out, "{route}")?;
            if !route.middleware.is_empty() {
                let names: Vec<&str> = route.middleware.iter().map(|m| m.label()).collect();
                write!(out, " [{}]", names.join(", "))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn normalize_methods(methods: &[Method], pattern: &str) -> Result<Vec<Method>, RouterError> {
    if methods.is_empty() {
        return Err(RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "route has no HTTP methods".to_string(),
        });
    }
    let mut out: Vec<Method> = Vec::with_capacity(methods.len());
    for method in methods {
        if !SUPPORTED_METHODS.contains(method) {
            return Err(RouterError::UnsupportedMethod(method.clone()));
        }
        if !out.contains(method) {
            out.push(method.clone());
        }
    }
    Ok(out)
}
