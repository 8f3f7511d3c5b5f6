use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use http::Method;
use serde_json::Value;
use tracing::{debug, error, info};

use super::request::{parse_query, split_uri, HandlerRequest, RequestId};
use super::response::HandlerResponse;
use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::handler::{Action, ControllerRegistry};
use crate::middleware::{MiddlewareRegistry, Pipeline, Resolver};
use crate::router::{
    trim_separators, DispatchOutcome, RouteMatch, Router, UrlContext, OVERRIDE_METHODS,
};

/// Hook consulted when no route matches the path under any method.
///
/// Returning `None` falls through to the regular 404 response.
pub type Fallback = Arc<dyn Fn(&mut HandlerRequest) -> Option<HandlerResponse> + Send + Sync>;

/// Parse an override signal sent with a request whose wire method is
/// `original`.
///
/// Only POST requests may override, and only to one of [`OVERRIDE_METHODS`].
#[must_use]
pub fn override_verb(original: &Method, raw: &str) -> Option<Method> {
    if *original != Method::POST {
        return None;
    }
    let candidate = Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).ok();
    match candidate {
        Some(method) if OVERRIDE_METHODS.contains(&method) => Some(method),
        _ => {
            debug!(value = %raw, "Ignoring invalid method override");
            None
        }
    }
}

/// Host used for absolute URLs when neither the request nor the configuration
/// names one.
const FALLBACK_HOST: &str = "localhost";

/// Per-route state resolved when the dispatcher is built
struct ResolvedRoute {
    pipeline: Pipeline,
    action: Action,
}

/// Matches requests against a finished route table and runs the matched
/// route's middleware pipeline and handler.
///
/// Every middleware reference and controller reference is resolved in
/// [`DispatcherBuilder::build`]. After that the dispatcher only reads shared
/// state, apart from the last-response slot.
pub struct Dispatcher {
    router: Arc<Router>,
    routes: Vec<ResolvedRoute>,
    global: Pipeline,
    config: RouterConfig,
    fallback: Option<Fallback>,
    last_response: Mutex<Option<HandlerResponse>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("global", &self.global)
            .field("config", &self.config)
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    router: Arc<Router>,
    controllers: ControllerRegistry,
    middleware: MiddlewareRegistry,
    config: RouterConfig,
    fallback: Option<Fallback>,
}

impl DispatcherBuilder {
    /// Controllers used to resolve `"Controller@action"` handler references
    #[must_use]
    pub fn controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    /// Registry used to resolve named middleware. Defaults to
    /// [`MiddlewareRegistry::with_builtins`].
    #[must_use]
    pub fn middleware(mut self, middleware: MiddlewareRegistry) -> Self {
        self.middleware = middleware;
        self
    }

    #[must_use]
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&mut HandlerRequest) -> Option<HandlerResponse> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Resolve every handler and middleware reference.
    ///
    /// Fails with `UnknownMiddleware` or `HandlerNotFound` on the first
    /// reference that does not resolve.
    pub fn build(self) -> Result<Dispatcher, RouterError> {
        let mut resolver = Resolver::new(&self.middleware);
        let global_stack = resolver.resolve_all(self.router.global_middleware())?;

        let mut routes = Vec::with_capacity(self.router.len());
        for route in self.router.routes().iter() {
            let action = self.controllers.resolve(&route.handler).inspect_err(|_| {
                error!(pattern = %route.pattern, handler = %route.handler.label(), "Handler not found");
            })?;
            let route_stack = resolver.resolve_all(&route.middleware)?;
            routes.push(ResolvedRoute {
                pipeline: Pipeline::compose(&global_stack, &route_stack),
                action,
            });
        }

        let global = Pipeline::new(global_stack);
        info!(
            routes = routes.len(),
            global_middleware = ?global.names(),
            "Dispatcher ready"
        );

        Ok(Dispatcher {
            router: self.router,
            routes,
            global,
            config: self.config,
            fallback: self.fallback,
            last_response: Mutex::new(None),
        })
    }
}

impl Dispatcher {
    pub fn builder(router: impl Into<Arc<Router>>) -> DispatcherBuilder {
        DispatcherBuilder {
            router: router.into(),
            controllers: ControllerRegistry::new(),
            middleware: MiddlewareRegistry::with_builtins(),
            config: RouterConfig::default(),
            fallback: None,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Override verb requested by a POST, if any.
    ///
    /// The configured header is consulted before the form field. Values that
    /// do not name one of [`OVERRIDE_METHODS`] are ignored, so an invalid
    /// header falls through to the form field.
    #[must_use]
    pub fn override_method(&self, req: &HandlerRequest) -> Option<Method> {
        if req.original_method != Method::POST {
            return None;
        }
        req.get_header(&self.config.method_override_header)
            .and_then(|raw| override_verb(&req.original_method, raw))
            .or_else(|| {
                req.get_form_field(&self.config.method_override_field)
                    .and_then(|raw| override_verb(&req.original_method, raw))
            })
    }

    /// Match a request without running anything.
    #[must_use]
    pub fn resolve(&self, req: &HandlerRequest) -> DispatchOutcome {
        let (path, _) = split_uri(&req.uri);
        self.router
            .resolve(&req.original_method, &path, self.override_method(req).as_ref())
    }

    /// Dispatch a request and return the final response.
    ///
    /// Dispatch-time failures (no match, method mismatch, handler errors,
    /// binding errors) come back as structured error responses.
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let start = Instant::now();
        req.request_id = RequestId::from_header_or_new(req.get_header("x-request-id"));
        let (path, query) = {
            let (path, query) = split_uri(&req.uri);
            (trim_separators(&path).to_string(), parse_query(&query))
        };
        req.path = path;
        req.query_params = query;

        let override_method = self.override_method(&req);
        let outcome = self
            .router
            .resolve(&req.original_method, &req.path, override_method.as_ref());

        let response = match outcome {
            DispatchOutcome::Matched(route_match) => self.run_matched(&mut req, route_match),
            DispatchOutcome::MethodMismatch(allowed) => {
                info!(
                    request_id = %req.request_id,
                    method = %req.original_method,
                    path = %req.path,
                    allowed = ?allowed,
                    "Method not allowed"
                );
                let err = RouterError::MethodMismatch {
                    path: req.path.clone(),
                    allowed,
                };
                let response = HandlerResponse::from_error(&err);
                self.global
                    .run(&mut req, HandlerResponse::default(), &|_req, _res| response.clone())
            }
            DispatchOutcome::NoMatch => {
                info!(
                    request_id = %req.request_id,
                    method = %req.original_method,
                    path = %req.path,
                    "No route matched"
                );
                let fallback = self.fallback.as_ref();
                self.global
                    .run(&mut req, HandlerResponse::default(), &|req, _res| {
                        fallback
                            .and_then(|hook| hook(&mut *req))
                            .unwrap_or_else(|| {
                                HandlerResponse::from_error(&RouterError::NoMatch(req.path.clone()))
                            })
                    })
            }
        };

        debug!(
            request_id = %req.request_id,
            status = response.status,
            latency_us = start.elapsed().as_micros() as u64,
            "Request dispatched"
        );
        *self
            .last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(response.clone());
        response
    }

    /// Dispatch a GET request for a raw URI
    pub fn dispatch_uri(&self, uri: &str) -> HandlerResponse {
        self.dispatch(HandlerRequest::get(uri))
    }

    fn run_matched(&self, req: &mut HandlerRequest, route_match: RouteMatch) -> HandlerResponse {
        let Some(resolved) = self.routes.get(route_match.index) else {
            error!(index = route_match.index, "Matched route was not resolved");
            return HandlerResponse::error(500, "Route was not resolved");
        };
        let route = &route_match.route;

        if route_match.method != req.original_method {
            debug!(
                request_id = %req.request_id,
                method = %req.original_method,
                effective = %route_match.method,
                "Method override applied"
            );
        }
        req.method = route_match.method;
        req.path_params = route_match.path_params;
        req.route_name = route.name.clone();
        req.route_group = route.group_tag.clone();

        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            pattern = %route.pattern,
            handler = %route.handler.label(),
            params = ?req.path_params,
            "Route matched"
        );

        let action = &resolved.action;
        let handler = route.handler.label();
        resolved
            .pipeline
            .run(req, HandlerResponse::default(), &|req, res| {
                match action.invoke(req, &res) {
                    Ok(response) => response,
                    Err(e) => {
                        error!(
                            request_id = %req.request_id,
                            handler = %handler,
                            error = %e,
                            "Handler failed"
                        );
                        HandlerResponse::from_error(&e)
                    }
                }
            })
    }

    /// Most recent response produced by [`dispatch`](Self::dispatch)
    #[must_use]
    pub fn last_response(&self) -> Option<HandlerResponse> {
        self.last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        self.last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|r| r.status)
    }

    /// Relative URL for a named route
    pub fn url(
        &self,
        name: &str,
        params: &[(&str, Value)],
        query: &[(&str, &str)],
    ) -> Result<String, RouterError> {
        self.router.url(name, params, query, None)
    }

    /// Absolute URL for a named route.
    ///
    /// Scheme and host come from `req` when given, then from the configured
    /// defaults, then `http://localhost`.
    pub fn absolute_url(
        &self,
        name: &str,
        params: &[(&str, Value)],
        query: &[(&str, &str)],
        req: Option<&HandlerRequest>,
    ) -> Result<String, RouterError> {
        let ctx = req
            .and_then(|r| UrlContext::from_request(r, &self.config))
            .or_else(|| UrlContext::from_config(&self.config))
            .unwrap_or_else(|| UrlContext::new(self.config.default_scheme.clone(), FALLBACK_HOST));
        self.router.url(name, params, query, Some(&ctx))
    }
}
