use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::core::Middleware;
use super::cors::CorsMiddleware;
use super::error_boundary::ErrorBoundary;
use super::metrics::MetricsMiddleware;
use super::tracing::TracingMiddleware;
use crate::error::RouterError;

/// Reference to a middleware, as stored on routes and groups.
#[derive(Clone)]
pub enum MiddlewareRef {
    /// Resolved through a [`MiddlewareRegistry`] when the dispatcher is built
    Named(String),
    Inline(Arc<dyn Middleware>),
}

impl MiddlewareRef {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            MiddlewareRef::Named(name) => name,
            MiddlewareRef::Inline(mw) => mw.name(),
        }
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Named(name) => write!(f, "Named({name})"),
            MiddlewareRef::Inline(mw) => write!(f, "Inline({})", mw.name()),
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        MiddlewareRef::Named(name.to_string())
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        MiddlewareRef::Named(name)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(mw: Arc<dyn Middleware>) -> Self {
        MiddlewareRef::Inline(mw)
    }
}

/// Builds a middleware instance
pub type MiddlewareFactory = Arc<dyn Fn() -> Arc<dyn Middleware> + Send + Sync>;

/// Name → factory table.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareRegistry")
            .field("names", &names)
            .finish()
    }
}

impl MiddlewareRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with `error_boundary`, `cors`, `tracing` and
    /// `metrics`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("error_boundary", || Arc::new(ErrorBoundary));
        registry.register("cors", || Arc::new(CorsMiddleware::default()));
        registry.register("tracing", || Arc::new(TracingMiddleware));
        registry.register("metrics", || Arc::new(MetricsMiddleware::new()));
        registry
    }

    /// Add or replace a factory
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Middleware> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Register an existing instance under a name; every reference to the
    /// name shares it.
    pub fn register_instance(&mut self, name: &str, instance: Arc<dyn Middleware>) {
        self.register(name, move || Arc::clone(&instance));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Turn a reference into an invocable middleware.
    pub fn resolve(&self, reference: &MiddlewareRef) -> Result<Arc<dyn Middleware>, RouterError> {
        match reference {
            MiddlewareRef::Inline(mw) => Ok(Arc::clone(mw)),
            MiddlewareRef::Named(name) => self
                .factories
                .get(name)
                .map(|factory| factory())
                .ok_or_else(|| RouterError::UnknownMiddleware(name.clone())),
        }
    }
}

/// Resolves references once per name so that every route naming the same
/// middleware shares one instance.
#[derive(Debug)]
pub(crate) struct Resolver<'a> {
    registry: &'a MiddlewareRegistry,
    instances: HashMap<String, Arc<dyn Middleware>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(registry: &'a MiddlewareRegistry) -> Self {
        Self {
            registry,
            instances: HashMap::new(),
        }
    }

    pub(crate) fn resolve_all(
        &mut self,
        references: &[MiddlewareRef],
    ) -> Result<Vec<Arc<dyn Middleware>>, RouterError> {
        references.iter().map(|r| self.resolve(r)).collect()
    }

    fn resolve(&mut self, reference: &MiddlewareRef) -> Result<Arc<dyn Middleware>, RouterError> {
        let MiddlewareRef::Named(name) = reference else {
            return self.registry.resolve(reference);
        };
        if let Some(existing) = self.instances.get(name) {
            return Ok(Arc::clone(existing));
        }
        let instance = self.registry.resolve(reference)?;
        self.instances.insert(name.clone(), Arc::clone(&instance));
        Ok(instance)
    }
}
