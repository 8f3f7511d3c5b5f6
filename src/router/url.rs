//! Reverse routing: route name + parameters → path or absolute URL.

use serde_json::Value;

use super::constraints::is_verbatim_type;
use super::core::Router;
use super::pattern::TOKEN;
use crate::config::RouterConfig;
use crate::dispatcher::HandlerRequest;
use crate::error::RouterError;

/// Scheme and host used to build absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlContext {
    pub scheme: String,
    pub host: String,
}

impl UrlContext {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Derive the context from the current request.
    ///
    /// The host comes from `X-Forwarded-Host` or `Host`, falling back to the
    /// configured default; the scheme from `X-Forwarded-Proto`, falling back to
    /// the configured default.
    #[must_use]
    pub fn from_request(req: &HandlerRequest, config: &RouterConfig) -> Option<Self> {
        let host = req
            .get_header("x-forwarded-host")
            .or_else(|| req.get_header("host"))
            .map(str::to_string)
            .or_else(|| config.default_host.clone())?;
        let scheme = req
            .get_header("x-forwarded-proto")
            .map(str::to_string)
            .unwrap_or_else(|| config.default_scheme.clone());
        Some(Self::new(scheme, host))
    }

    /// Context built only from configured defaults
    #[must_use]
    pub fn from_config(config: &RouterConfig) -> Option<Self> {
        config
            .default_host
            .as_ref()
            .map(|host| Self::new(config.default_scheme.clone(), host.clone()))
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Router {
    /// Build the URL for a named route.
    ///
    /// Every parameter of the route must be supplied with a non-null value.
    /// Values for `int`, `numeric`, `bool` and `uuid` parameters are emitted
    /// verbatim; all others are percent-encoded. `query` pairs are appended as a form-encoded query
    /// string. With `absolute`, the result is prefixed with scheme and host.
    pub fn url(
        &self,
        name: &str,
        params: &[(&str, Value)],
        query: &[(&str, &str)],
        absolute: Option<&UrlContext>,
    ) -> Result<String, RouterError> {
        let route = self
            .routes()
            .by_name(name)
            .ok_or_else(|| RouterError::UnknownRouteName(name.to_string()))?;

        // a null value counts as not supplied
        let lookup = |param: &str| {
            params
                .iter()
                .rev()
                .find(|(k, _)| *k == param)
                .map(|(_, v)| v)
                .filter(|v| !v.is_null())
        };

        let mut missing: Vec<String> = Vec::new();
        for param in &route.param_names {
            let param = param.as_ref();
            if lookup(param).is_none() && !missing.iter().any(|m| m == param) {
                missing.push(param.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(RouterError::MissingRouteParams {
                route: name.to_string(),
                missing,
            });
        }

        let path = TOKEN.replace_all(&route.pattern, |caps: &regex::Captures<'_>| {
            let param = caps.get(1).map_or("", |m| m.as_str());
            let type_name = caps.get(2).map_or("", |m| m.as_str());
            let raw = lookup(param).map(stringify).unwrap_or_default();
            if is_verbatim_type(type_name) {
                raw
            } else {
                urlencoding::encode(&raw).into_owned()
            }
        });

        let mut url = String::with_capacity(path.len() + 16);
        if let Some(ctx) = absolute {
            url.push_str(&ctx.scheme);
            url.push_str("://");
            url.push_str(ctx.host.trim_end_matches('/'));
        }
        url.push('/');
        url.push_str(&path);

        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter())
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }
        Ok(url)
    }
}
