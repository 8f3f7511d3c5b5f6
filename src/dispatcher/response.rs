use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::request::HeaderVec;
use crate::error::RouterError;

/// Response produced by a handler and threaded through the middleware
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: String,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

impl HandlerResponse {
    /// Empty response with the given status
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: String::new(),
        }
    }

    /// `text/plain` response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "text/plain; charset=utf-8".to_string());
        res.body = body.into();
        res
    }

    /// 200 `text/plain` response
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::text(200, body)
    }

    /// JSON response
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut res = Self::new(status);
        res.set_header("content-type", "application/json".to_string());
        res.body = body.to_string();
        res
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// Structured response for a dispatch-time error.
    ///
    /// `MethodMismatch` carries an `Allow` header listing the permitted verbs.
    #[must_use]
    pub fn from_error(err: &RouterError) -> Self {
        let mut res = Self::error(err.status(), &err.to_string());
        if let RouterError::MethodMismatch { allowed, .. } = err {
            let allow = allowed
                .iter()
                .map(http::Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            res.set_header("allow", allow);
        }
        res
    }

    /// Parse the body as JSON
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
