use std::sync::Arc;

use super::core::{Middleware, Next};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// An ordered middleware stack wrapped around a terminal handler.
///
/// The first element is the outermost layer: it runs first on the way in and
/// last on the way out.
#[derive(Clone, Default)]
pub struct Pipeline {
    stack: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(stack: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stack }
    }

    /// `global ++ route`, where route middleware already carries its group
    /// middleware in front.
    #[must_use]
    pub fn compose(global: &[Arc<dyn Middleware>], route: &[Arc<dyn Middleware>]) -> Self {
        let stack = global.iter().chain(route).map(Arc::clone).collect();
        Self { stack }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Middleware names, outermost first
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stack.iter().map(|mw| mw.name()).collect()
    }

    /// Run the pipeline.
    ///
    /// The chain is built right to left: `terminal` is the innermost
    /// function and each middleware, last to first, wraps the chain built so
    /// far.
    pub fn run<T>(&self, req: &mut HandlerRequest, res: HandlerResponse, terminal: &T) -> HandlerResponse
    where
        T: Fn(&mut HandlerRequest, HandlerResponse) -> HandlerResponse,
    {
        let mut chain: Box<Next<'_>> =
            Box::new(move |req: &mut HandlerRequest, res: HandlerResponse| terminal(req, res));
        for mw in self.stack.iter().rev() {
            let inner = chain;
            chain = Box::new(move |req: &mut HandlerRequest, res: HandlerResponse| {
                mw.handle(req, res, &*inner)
            });
        }
        chain(req, res)
    }
}
