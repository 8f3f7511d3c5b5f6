use serde_json::Value;

use super::core::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Bearer-token gate.
///
/// Requests without `Authorization: Bearer <token>` matching the configured
/// token are answered with 401 and never reach the rest of the pipeline. On
/// success the request gets an `auth.subject` attribute.
pub struct AuthMiddleware {
    token: String,
    subject: String,
}

impl AuthMiddleware {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: "authenticated".to_string(),
        }
    }

    /// Subject recorded on authenticated requests
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    fn authorized(&self, req: &HandlerRequest) -> bool {
        req.get_header("authorization")
            .and_then(|h| {
                let (scheme, token) = h.trim().split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .is_some_and(|token| token == self.token)
    }
}

impl Middleware for AuthMiddleware {
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse {
        if !self.authorized(req) {
            tracing::debug!(
                request_id = %req.request_id,
                path = %req.path,
                "Rejected request without valid bearer token"
            );
            let mut denied = HandlerResponse::error(401, "Unauthorized");
            denied.set_header("www-authenticate", "Bearer".to_string());
            return denied;
        }
        req.attributes
            .insert("auth.subject".to_string(), Value::String(self.subject.clone()));
        next(req, res)
    }

    fn name(&self) -> &str {
        "auth"
    }
}
