use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::core::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Request counters.
///
/// All counters use atomic operations; the middleware only observes.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time, zero before the first request
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses with a 4xx status
    #[must_use]
    pub fn client_errors(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    /// Responses with a 5xx status
    #[must_use]
    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }
}

impl Middleware for MetricsMiddleware {
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse {
        let start = Instant::now();
        let res = next(req, res);
        let elapsed = start.elapsed().as_nanos() as u64;

        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(elapsed.max(1), Ordering::Relaxed);
        match res.status {
            400..=499 => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
        res
    }

    fn name(&self) -> &str {
        "metrics"
    }
}
