//! # Route Cache
//!
//! A finished route table can be exported to a JSON file and imported on the
//! next start instead of compiling and collision-checking every route again.
//!
//! The cache is keyed by a SHA-256 hash of whatever the table was built from
//! (usually the route manifest). A cache whose hash or format version does
//! not match is ignored by [`crate::manifest::load_router`] and rewritten.
//!
//! Only tables built from named references can be exported: inline handlers
//! and inline middleware have no serializable form and make
//! [`Router::export`] fail with `NotCacheable`.
//!
//! Converters are code, not data. Custom constraint fragments are written to
//! the cache; converters must be registered by the application, before or
//! after the import.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::RouterError;
use crate::handler::HandlerRef;
use crate::middleware::MiddlewareRef;
use crate::router::{anchored, CompiledPattern, CompiledRoute, Router};

/// Bumped whenever the serialized layout changes
pub const CACHE_VERSION: u32 = 1;

/// Serialized form of one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub methods: Vec<String>,
    /// Full template, separators trimmed
    pub pattern: String,
    /// Unanchored regex source
    pub source: String,
    pub param_names: Vec<String>,
    pub param_types: Vec<String>,
    /// `Controller@action`
    pub handler: String,
    /// Middleware names, group middleware first
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub group_tag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Serialized route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCache {
    pub version: u32,
    /// Hash of the source the table was built from
    pub source_hash: String,
    /// Custom constraint fragments by type name
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    #[serde(default)]
    pub global_middleware: Vec<String>,
    pub routes: Vec<RouteRecord>,
}

/// SHA-256 of `content`, lowercase hex
#[must_use]
pub fn source_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

impl RouteCache {
    /// Whether this cache was written by this format version for `hash`
    #[must_use]
    pub fn matches(&self, hash: &str) -> bool {
        self.version == CACHE_VERSION && self.source_hash == hash
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route cache {}", path.display()))?;
        let cache: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse route cache {}", path.display()))?;
        debug!(path = %path.display(), routes = cache.routes.len(), "Route cache read");
        Ok(cache)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize route cache")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write route cache {}", path.display()))?;
        info!(path = %path.display(), routes = self.routes.len(), "Route cache written");
        Ok(())
    }
}

fn middleware_names(refs: &[MiddlewareRef], owner: &str) -> Result<Vec<String>, RouterError> {
    refs.iter()
        .map(|r| match r {
            MiddlewareRef::Named(name) => Ok(name.clone()),
            MiddlewareRef::Inline(mw) => Err(RouterError::NotCacheable(format!(
                "{owner} uses inline middleware '{}'",
                mw.name()
            ))),
        })
        .collect()
}

fn parse_method(raw: &str, pattern: &str) -> Result<Method, RouterError> {
    Method::from_bytes(raw.as_bytes()).map_err(|_| RouterError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: format!("invalid method '{raw}' in route cache"),
    })
}

impl Router {
    /// Serialize the route table.
    pub fn export(&self, source_hash: &str) -> Result<RouteCache, RouterError> {
        let mut routes = Vec::with_capacity(self.len());
        for route in self.routes().iter() {
            let owner = format!("route '{}'", route.pattern);
            let handler = match &route.handler {
                HandlerRef::Controller { .. } => route.handler.label(),
                HandlerRef::Action(_) => {
                    return Err(RouterError::NotCacheable(format!(
                        "{owner} uses an inline handler"
                    )))
                }
            };
            routes.push(RouteRecord {
                methods: route.methods.iter().map(|m| m.to_string()).collect(),
                pattern: route.pattern.clone(),
                source: route.source.clone(),
                param_names: route.param_names.iter().map(|n| n.to_string()).collect(),
                param_types: route.param_types.clone(),
                handler,
                middleware: middleware_names(&route.middleware, &owner)?,
                group_tag: route.group_tag.clone(),
                name: route.name.clone(),
            });
        }

        let constraints = self
            .constraints()
            .custom()
            .filter_map(|spec| Some((spec.name.clone(), spec.pattern.clone()?)))
            .collect();

        Ok(RouteCache {
            version: CACHE_VERSION,
            source_hash: source_hash.to_string(),
            constraints,
            global_middleware: middleware_names(self.global_middleware(), "global middleware")?,
            routes,
        })
    }

    /// Append every cached route without collision detection.
    ///
    /// Custom constraint fragments are restored (keeping any converter already
    /// registered under the same name) and the global middleware is replaced
    /// when the cache carries any.
    pub fn import(&mut self, cache: &RouteCache) -> Result<(), RouterError> {
        for (name, pattern) in &cache.constraints {
            if self.constraints().pattern_for(name) != Some(pattern.as_str()) {
                self.constraints_mut().register_pattern(name, pattern.clone());
            }
        }
        if !cache.global_middleware.is_empty() {
            self.set_global_middleware(
                cache
                    .global_middleware
                    .iter()
                    .map(|n| MiddlewareRef::Named(n.clone()))
                    .collect(),
            );
        }

        for record in &cache.routes {
            let methods = record
                .methods
                .iter()
                .map(|m| parse_method(m, &record.pattern))
                .collect::<Result<Vec<_>, _>>()?;
            let regex = anchored(&record.source, &record.pattern)?;
            let compiled = CompiledPattern {
                source: record.source.clone(),
                param_names: record.param_names.clone(),
                param_types: record.param_types.clone(),
            };
            let mut route = CompiledRoute::new(
                methods,
                record.pattern.clone(),
                compiled,
                regex,
                HandlerRef::parse(&record.handler),
                record
                    .middleware
                    .iter()
                    .map(|n| MiddlewareRef::Named(n.clone()))
                    .collect(),
                record.group_tag.clone(),
            )?;
            route.name = record.name.clone();
            self.push_trusted(route)?;
        }

        info!(routes = cache.routes.len(), "Route table imported from cache");
        Ok(())
    }
}
