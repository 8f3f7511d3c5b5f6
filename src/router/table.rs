use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use regex::Regex;

use super::pattern::{group_name, CompiledPattern};
use crate::error::RouterError;
use crate::handler::HandlerRef;
use crate::middleware::MiddlewareRef;

/// A registered route.
///
/// Everything except `name` is fixed at registration.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    /// Methods the route answers to, deduplicated, in registration order
    pub methods: Vec<Method>,
    /// Anchored regex matched against trimmed request paths
    pub regex: Regex,
    /// Unanchored regex source as produced by the pattern compiler
    pub source: String,
    pub param_names: Vec<Arc<str>>,
    /// Constraint type per parameter, `""` when untyped
    pub param_types: Vec<String>,
    /// Capture group index per parameter
    pub(crate) param_groups: Vec<usize>,
    pub handler: HandlerRef,
    /// Group middleware followed by route middleware
    pub middleware: Vec<MiddlewareRef>,
    /// Full template (group prefixes included) with separators trimmed
    pub pattern: String,
    pub group_tag: Option<String>,
    pub name: Option<String>,
}

impl CompiledRoute {
    pub(crate) fn new(
        methods: Vec<Method>,
        pattern: String,
        compiled: CompiledPattern,
        regex: Regex,
        handler: HandlerRef,
        middleware: Vec<MiddlewareRef>,
        group_tag: Option<String>,
    ) -> Result<Self, RouterError> {
        let param_groups = locate_groups(&regex, compiled.param_names.len(), &pattern)?;
        Ok(Self {
            methods,
            regex,
            source: compiled.source,
            param_names: compiled
                .param_names
                .iter()
                .map(|n| Arc::from(n.as_str()))
                .collect(),
            param_types: compiled.param_types,
            param_groups,
            handler,
            middleware,
            pattern,
            group_tag,
            name: None,
        })
    }

    /// A route without parameters
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.param_names.is_empty()
    }

    #[must_use]
    pub fn answers(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Methods shared with another route
    #[must_use]
    pub fn shared_methods(&self, other: &CompiledRoute) -> Vec<Method> {
        self.methods
            .iter()
            .filter(|m| other.answers(m))
            .cloned()
            .collect()
    }
}

impl fmt::Display for CompiledRoute {
    /// `GET|HEAD /users/{id:int} -> UserController@show (users.show)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods = self
            .methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join("|");
        write!(f, "{methods} /{} -> {}", self.pattern, self.handler.label())?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}

/// Map each parameter to its capture group index.
fn locate_groups(regex: &Regex, count: usize, pattern: &str) -> Result<Vec<usize>, RouterError> {
    (0..count)
        .map(|i| {
            let wanted = group_name(i);
            regex
                .capture_names()
                .position(|n| n == Some(wanted.as_str()))
                .ok_or_else(|| RouterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("capture group for parameter {i} is missing"),
                })
        })
        .collect()
}

/// Ordered routes plus the name index.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<CompiledRoute>>,
    names: HashMap<String, usize>,
}

impl RouteTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<CompiledRoute>> {
        self.routes.get(index)
    }

    /// Routes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledRoute>> {
        self.routes.iter()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Arc<CompiledRoute>> {
        self.index_of(name).and_then(|i| self.routes.get(i))
    }

    pub(crate) fn push(&mut self, route: CompiledRoute) -> Result<usize, RouterError> {
        let index = self.routes.len();
        if let Some(name) = route.name.clone() {
            self.index_name(index, name)?;
        }
        self.routes.push(Arc::new(route));
        Ok(index)
    }

    /// Name the route at `index`
    pub(crate) fn assign_name(&mut self, index: usize, name: &str) -> Result<(), RouterError> {
        if let Some(existing) = self.names.get(name) {
            if *existing == index {
                return Ok(());
            }
            return Err(RouterError::DuplicateRouteName(name.to_string()));
        }
        let Some(slot) = self.routes.get_mut(index) else {
            return Err(RouterError::NoRouteToName);
        };
        if let Some(old) = Arc::make_mut(slot).name.replace(name.to_string()) {
            self.names.remove(&old);
        }
        self.index_name(index, name.to_string())
    }

    fn index_name(&mut self, index: usize, name: String) -> Result<(), RouterError> {
        if self.names.contains_key(&name) {
            return Err(RouterError::DuplicateRouteName(name));
        }
        self.names.insert(name, index);
        Ok(())
    }
}
