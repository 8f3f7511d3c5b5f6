use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use serde::{Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;

use crate::router::ParamVec;

/// Maximum inline headers/fields before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Name/value pairs for headers, query parameters and form fields.
///
/// Names are `Arc<str>` since most of them repeat across requests.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// ULID request identifier.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a caller-supplied id when it parses, otherwise generate one.
    #[must_use]
    pub fn from_header_or_new(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A request travelling through the dispatcher.
///
/// The front controller fills in the method, raw URI, headers and form
/// fields. The dispatcher fills in the path, query parameters, converted path
/// parameters and route metadata before the middleware pipeline runs.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    /// Effective method. Starts as the literal request method and is replaced
    /// by the override verb when the route matched through a method override.
    pub method: Method,
    /// Method as received on the wire
    pub original_method: Method,
    /// Raw request target, query string included
    pub uri: String,
    /// Path component with separators trimmed
    pub path: String,
    /// Converted path parameters in pattern order
    pub path_params: ParamVec,
    pub query_params: HeaderVec,
    /// HTTP headers, names compared case-insensitively
    pub headers: HeaderVec,
    /// Decoded form body fields
    pub form: HeaderVec,
    /// Raw body
    pub body: Option<String>,
    /// Name of the matched route, if it was named
    pub route_name: Option<String>,
    /// Group tag of the matched route
    pub route_group: Option<String>,
    /// Values attached by middleware (authenticated subject, timings, ...)
    pub attributes: HashMap<String, Value>,
}

impl HandlerRequest {
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            original_method: method.clone(),
            method,
            uri: uri.into(),
            path: String::new(),
            path_params: ParamVec::new(),
            query_params: HeaderVec::new(),
            headers: HeaderVec::new(),
            form: HeaderVec::new(),
            body: None,
            route_name: None,
            route_group: None,
            attributes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    #[must_use]
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_form_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.form.push((Arc::from(name), value.into()));
        self
    }

    /// Set a raw `application/x-www-form-urlencoded` body and decode its fields.
    #[must_use]
    pub fn with_form_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.form = url::form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect();
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a converted path parameter by name.
    ///
    /// Uses "last write wins" when a pattern repeats a name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&Value> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_form_field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
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

/// Split a raw request target into its path and query components.
///
/// Absolute-form targets (`http://host/path?q`) are parsed with [`url::Url`]
/// and only their path and query are kept. The fragment, if any, is dropped.
#[must_use]
pub fn split_uri(raw: &str) -> (Cow<'_, str>, Cow<'_, str>) {
    if has_scheme(raw) {
        if let Ok(url) = url::Url::parse(raw) {
            return (
                Cow::Owned(url.path().to_string()),
                Cow::Owned(url.query().unwrap_or_default().to_string()),
            );
        }
    }
    let raw = raw.split('#').next().unwrap_or(raw);
    match raw.split_once('?') {
        Some((path, query)) => (Cow::Borrowed(path), Cow::Borrowed(query)),
        None => (Cow::Borrowed(raw), Cow::Borrowed("")),
    }
}

/// `scheme://` prefix per RFC 3986
fn has_scheme(raw: &str) -> bool {
    raw.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Decode a query string into name/value pairs.
#[must_use]
pub fn parse_query(query: &str) -> HeaderVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}
