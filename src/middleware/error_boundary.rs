use std::panic::{catch_unwind, AssertUnwindSafe};

use super::core::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Turns a panic anywhere downstream into a structured 500 response.
///
/// An ordinary pipeline participant: place it first in the global middleware
/// list to cover everything, or on a single route to cover only that route.
pub struct ErrorBoundary;

impl Middleware for ErrorBoundary {
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse {
        let request_id = req.request_id;
        let path = req.path.clone();
        match catch_unwind(AssertUnwindSafe(|| next(req, res))) {
            Ok(res) => res,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    panic_message = %message,
                    "Handler panicked"
                );
                HandlerResponse::error(500, &format!("Internal Server Error: {message}"))
            }
        }
    }

    fn name(&self) -> &str {
        "error_boundary"
    }
}
