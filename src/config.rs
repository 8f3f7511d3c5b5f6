//! # Router Configuration
//!
//! Settings that affect dispatch and URL generation, loaded from environment
//! variables or a YAML file.
//!
//! ## Environment Variables
//!
//! | variable                           | field                    | default                  |
//! |------------------------------------|--------------------------|--------------------------|
//! | `RAILYARD_METHOD_OVERRIDE_HEADER`  | `method_override_header` | `X-HTTP-Method-Override` |
//! | `RAILYARD_METHOD_OVERRIDE_FIELD`   | `method_override_field`  | `_method`                |
//! | `RAILYARD_DEFAULT_SCHEME`          | `default_scheme`         | `http`                   |
//! | `RAILYARD_DEFAULT_HOST`            | `default_host`           | unset                    |
//! | `RAILYARD_ROUTE_CACHE`             | `route_cache`            | unset                    |
//!
//! Empty values are treated as unset.
//!
//! ## Usage
//!
//! ```rust
//! use railyard::config::RouterConfig;
//!
//! let config = RouterConfig::from_env_with(|key| match key {
//!     "RAILYARD_DEFAULT_HOST" => Some("example.test".to_string()),
//!     _ => None,
//! });
//! assert_eq!(config.default_host.as_deref(), Some("example.test"));
//! assert_eq!(config.method_override_field, "_method");
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";
pub const DEFAULT_OVERRIDE_FIELD: &str = "_method";

/// Dispatch and URL generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Header carrying a method override on POST requests
    pub method_override_header: String,
    /// Form field carrying a method override on POST requests
    pub method_override_field: String,
    /// Scheme for absolute URLs when the request does not provide one
    pub default_scheme: String,
    /// Host for absolute URLs when the request does not provide one
    pub default_host: Option<String>,
    /// Route cache file used by bootstrap code
    pub route_cache: Option<PathBuf>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            method_override_header: DEFAULT_OVERRIDE_HEADER.to_string(),
            method_override_field: DEFAULT_OVERRIDE_FIELD.to_string(),
            default_scheme: "http".to_string(),
            default_host: None,
            route_cache: None,
        }
    }
}

impl RouterConfig {
    /// Load configuration from `RAILYARD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            method_override_header: var("RAILYARD_METHOD_OVERRIDE_HEADER")
                .unwrap_or(defaults.method_override_header),
            method_override_field: var("RAILYARD_METHOD_OVERRIDE_FIELD")
                .unwrap_or(defaults.method_override_field),
            default_scheme: var("RAILYARD_DEFAULT_SCHEME")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(defaults.default_scheme),
            default_host: var("RAILYARD_DEFAULT_HOST"),
            route_cache: var("RAILYARD_ROUTE_CACHE").map(PathBuf::from),
        }
    }

    /// Load configuration from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
