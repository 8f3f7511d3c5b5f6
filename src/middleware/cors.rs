use http::Method;

use super::core::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// CORS (Cross-Origin Resource Sharing) middleware
///
/// Preflight requests (`OPTIONS` carrying `Access-Control-Request-Method`)
/// are answered with 204 without running the rest of the pipeline. Every
/// other response is decorated with the `Access-Control-Allow-*` headers.
pub struct CorsMiddleware {
    allowed_origins: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
    max_age_secs: Option<u32>,
}

impl CorsMiddleware {
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
    ) -> Self {
        Self {
            allowed_origins,
            allowed_headers,
            allowed_methods,
            max_age_secs: None,
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, secs: u32) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    /// Value for `Access-Control-Allow-Origin`, `None` when the origin is not
    /// allowed.
    fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        let origin = origin?;
        self.allowed_origins
            .iter()
            .find(|o| o.eq_ignore_ascii_case(origin))
            .map(|_| origin.to_string())
    }

    fn decorate(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        let Some(origin) = self.allow_origin(req.get_header("origin")) else {
            return;
        };
        if origin != "*" {
            res.set_header("vary", "Origin".to_string());
        }
        res.set_header("access-control-allow-origin", origin);
        res.set_header(
            "access-control-allow-headers",
            self.allowed_headers.join(", "),
        );
        let methods = self
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        res.set_header("access-control-allow-methods", methods);
    }
}

/// Permissive policy: any origin, common headers and methods
impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new(
            vec!["*".into()],
            vec!["Content-Type".into(), "Authorization".into()],
            vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ],
        )
    }
}

impl Middleware for CorsMiddleware {
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse {
        let preflight = req.original_method == Method::OPTIONS
            && req.get_header("access-control-request-method").is_some();
        if preflight {
            let mut res = HandlerResponse::new(204);
            self.decorate(req, &mut res);
            if let Some(secs) = self.max_age_secs {
                res.set_header("access-control-max-age", secs.to_string());
            }
            return res;
        }

        let mut res = next(req, res);
        self.decorate(req, &mut res);
        res
    }

    fn name(&self) -> &str {
        "cors"
    }
}
