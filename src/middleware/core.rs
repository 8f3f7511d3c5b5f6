use std::fmt;
use std::sync::Arc;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// The rest of the pipeline as seen from inside a middleware.
pub type Next<'a> = dyn Fn(&mut HandlerRequest, HandlerResponse) -> HandlerResponse + 'a;

/// A middleware unit: `(request, response, next) -> response`.
///
/// Code before `next(req, res)` runs on the way in, code after it on the way
/// out. Returning without calling `next` short-circuits everything
/// downstream, including the handler.
pub trait Middleware: Send + Sync {
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.name())
    }
}

/// Middleware backed by a closure.
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut HandlerRequest, HandlerResponse, &Next<'_>) -> HandlerResponse + Send + Sync,
{
    fn handle(
        &self,
        req: &mut HandlerRequest,
        res: HandlerResponse,
        next: &Next<'_>,
    ) -> HandlerResponse {
        (self.f)(req, res, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a shareable middleware.
///
/// ```rust
/// use railyard::middleware::from_fn;
///
/// let stamp = from_fn("stamp", |req, res, next| {
///     let mut res = next(req, res);
///     res.set_header("x-stamp", "1".to_string());
///     res
/// });
/// assert_eq!(stamp.name(), "stamp");
/// ```
pub fn from_fn<F>(name: &str, f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut HandlerRequest, HandlerResponse, &Next<'_>) -> HandlerResponse
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnMiddleware {
        name: name.to_string(),
        f,
    })
}
