//! # Route Manifest
//!
//! A YAML description of a route table, used by bootstrap code and the
//! `railyard` CLI.
//!
//! ```yaml
//! constraints:
//!   lang: "en|fr|de"
//! middleware: [error_boundary, cors]
//! routes:
//!   - path: /
//!     handler: HomeController
//!     name: home
//!   - prefix: api
//!     middleware: [auth]
//!     tag: api
//!     routes:
//!       - methods: [GET, HEAD]
//!         path: users/{id:int}
//!         handler: UserController@show
//!         name: users.show
//!       - method: DELETE
//!         path: users/{id:int}
//!         handler: UserController@destroy
//! ```
//!
//! Entries with `routes` are groups and may nest. Route entries default to
//! `GET`; `ANY` registers every supported verb. Handlers are always
//! `Controller@action` strings, so manifest-built tables can be cached.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::{source_hash, RouteCache};
use crate::error::RouterError;
use crate::middleware::MiddlewareRef;
use crate::router::{GroupOptions, Router, SUPPORTED_METHODS};

/// One method or a list of methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodList {
    One(String),
    Many(Vec<String>),
}

impl MethodList {
    fn names(&self) -> Vec<&str> {
        match self {
            MethodList::One(m) => vec![m.as_str()],
            MethodList::Many(ms) => ms.iter().map(String::as_str).collect(),
        }
    }
}

/// A route or a group of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Group {
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        middleware: Vec<String>,
        #[serde(default)]
        tag: Option<String>,
        routes: Vec<ManifestEntry>,
    },
    Route {
        #[serde(default, alias = "method")]
        methods: Option<MethodList>,
        path: String,
        handler: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        middleware: Vec<String>,
    },
}

/// Parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    /// Custom constraint fragments by type name
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    /// Global middleware names
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub routes: Vec<ManifestEntry>,
}

fn named(names: &[String]) -> Vec<MiddlewareRef> {
    names.iter().map(|n| MiddlewareRef::Named(n.clone())).collect()
}

fn parse_methods(list: Option<&MethodList>, path: &str) -> Result<Vec<Method>, RouterError> {
    let Some(list) = list else {
        return Ok(vec![Method::GET]);
    };
    let mut methods = Vec::new();
    for raw in list.names() {
        let upper = raw.trim().to_ascii_uppercase();
        if upper == "ANY" {
            methods.extend(SUPPORTED_METHODS.iter().cloned());
            continue;
        }
        let method =
            Method::from_bytes(upper.as_bytes()).map_err(|_| RouterError::InvalidPattern {
                pattern: path.to_string(),
                reason: format!("invalid method '{raw}'"),
            })?;
        methods.push(method);
    }
    Ok(methods)
}

fn register_entries(router: &mut Router, entries: &[ManifestEntry]) -> Result<(), RouterError> {
    for entry in entries {
        match entry {
            ManifestEntry::Group {
                prefix,
                middleware,
                tag,
                routes,
            } => {
                let options = GroupOptions {
                    prefix: prefix.clone(),
                    middleware: named(middleware),
                    tag: tag.clone(),
                };
                router.group(options, |r| register_entries(r, routes))?;
            }
            ManifestEntry::Route {
                methods,
                path,
                handler,
                name,
                middleware,
            } => {
                let methods = parse_methods(methods.as_ref(), path)?;
                let handle = router.add(&methods, path, handler.as_str(), named(middleware))?;
                if let Some(name) = name {
                    handle.name(name)?;
                }
            }
        }
    }
    Ok(())
}

impl RouteManifest {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to parse route manifest")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route manifest {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("In {}", path.display()))
    }

    /// Router carrying only the manifest's constraints and global middleware
    fn base_router(&self) -> Router {
        let mut router = Router::new();
        for (name, pattern) in &self.constraints {
            router.constraints_mut().register(name, pattern.clone());
        }
        router.set_global_middleware(named(&self.middleware));
        router
    }

    /// Register every entry on a fresh router.
    pub fn build_router(&self) -> Result<Router, RouterError> {
        let mut router = self.base_router();
        register_entries(&mut router, &self.routes)?;
        Ok(router)
    }

    /// Register every entry on an existing router, inside its current scope.
    pub fn register_into(&self, router: &mut Router) -> Result<(), RouterError> {
        for (name, pattern) in &self.constraints {
            router.constraints_mut().register(name, pattern.clone());
        }
        register_entries(router, &self.routes)
    }
}

/// Build a router from a manifest file, going through a route cache when one
/// is given.
///
/// A cache whose hash matches the manifest source is imported as-is. Otherwise
/// the manifest is compiled and the cache rewritten; a failure to write the
/// cache is logged and does not fail the load.
pub fn load_router(manifest_path: &Path, cache_path: Option<&Path>) -> Result<Router> {
    let raw = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read route manifest {}", manifest_path.display()))?;
    let hash = source_hash(raw.as_bytes());
    let manifest = RouteManifest::from_yaml_str(&raw)
        .with_context(|| format!("In {}", manifest_path.display()))?;

    if let Some(cache_path) = cache_path.filter(|p| p.exists()) {
        match RouteCache::read(cache_path) {
            Ok(cache) if cache.matches(&hash) => {
                let mut router = manifest.base_router();
                router.import(&cache)?;
                info!(cache = %cache_path.display(), routes = router.len(), "Route cache hit");
                return Ok(router);
            }
            Ok(_) => info!(cache = %cache_path.display(), "Route cache is stale"),
            Err(e) => warn!(cache = %cache_path.display(), error = %e, "Ignoring unreadable route cache"),
        }
    }

    let router = manifest.build_router()?;
    info!(
        manifest = %manifest_path.display(),
        routes = router.len(),
        "Route table compiled"
    );

    if let Some(cache_path) = cache_path {
        let written = router
            .export(&hash)
            .map_err(anyhow::Error::from)
            .and_then(|cache| cache.write(cache_path));
        if let Err(e) = written {
            warn!(cache = %cache_path.display(), error = %e, "Route cache not written");
        }
    }
    Ok(router)
}
