use std::time::Instant;

use tracing::{info, info_span};

use super::core::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Wraps the rest of the pipeline in a `request` span and logs the outcome.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse {
        let span = info_span!(
            "request",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route = req.route_name.as_deref().unwrap_or(""),
        );
        let _entered = span.enter();
        let start = Instant::now();

        let res = next(req, res);

        info!(
            status = res.status,
            latency_us = start.elapsed().as_micros() as u64,
            "Request complete"
        );
        res
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
