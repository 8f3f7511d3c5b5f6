use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::Method;
use railyard::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use railyard::handler::Action;
use railyard::middleware::{
    from_fn, AuthMiddleware, MetricsMiddleware, MiddlewareRef, MiddlewareRegistry, Pipeline,
};
use railyard::router::{GroupOptions, Router};
use railyard::RouterError;

mod common;
use common::fixtures::{appender, recorder, text};
use common::tracing_util::TestTracing;

#[test]
fn test_onion_order_global_group_route() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    router.set_global_middleware(vec![
        appender("G1").into(),
        appender("G2").into(),
        recorder("in:G", Arc::clone(&log)).into(),
    ]);
    router
        .group(
            GroupOptions::prefix("api")
                .middleware(appender("Grp"))
                .middleware(recorder("in:Grp", Arc::clone(&log))),
            |r| {
                r.add(
                    &[Method::GET],
                    "ping",
                    text("pong"),
                    vec![
                        appender("Rt").into(),
                        recorder("in:Rt", Arc::clone(&log)).into(),
                    ],
                )?;
                Ok(())
            },
        )
        .unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();

    let res = dispatcher.dispatch_uri("/api/ping");
    assert_eq!(res.body, "pong|Rt|Grp|G2|G1");
    assert_eq!(*log.lock().unwrap(), vec!["in:G", "in:Grp", "in:Rt"]);
}

#[test]
fn test_nested_group_middleware_accumulates_outer_first() {
    let mut router = Router::new();
    router
        .group(GroupOptions::prefix("a").middleware(appender("outer")), |r| {
            r.group(GroupOptions::prefix("b").middleware(appender("inner")), |r| {
                r.get("c", text("x"))?;
                Ok(())
            })
        })
        .unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();
    assert_eq!(dispatcher.dispatch_uri("/a/b/c").body, "x|inner|outer");
}

#[test]
fn test_middleware_can_short_circuit() {
    let reached = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&reached);
    let mut router = Router::new();
    router
        .add(
            &[Method::GET],
            "closed",
            Action::from_request_fn(move |_req| {
                flag.store(true, Ordering::SeqCst);
                HandlerResponse::ok("open")
            }),
            vec![from_fn("gate", |_req, _res, _next| HandlerResponse::text(503, "maintenance")).into()],
        )
        .unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();

    let res = dispatcher.dispatch_uri("/closed");
    assert_eq!(res.status, 503);
    assert!(!reached.load(Ordering::SeqCst));
}

#[test]
fn test_auth_gate() {
    let mut registry = MiddlewareRegistry::with_builtins();
    registry.register_instance(
        "auth",
        Arc::new(AuthMiddleware::new("s3cret").with_subject("alice")),
    );

    let mut router = Router::new();
    router.get("public", text("hello")).unwrap();
    router
        .group(GroupOptions::prefix("admin").middleware("auth"), |r| {
            r.get(
                "me",
                Action::from_request_fn(|req| {
                    let subject = req
                        .attributes
                        .get("auth.subject")
                        .and_then(|v| v.as_str())
                        .unwrap_or("nobody")
                        .to_string();
                    HandlerResponse::ok(subject)
                }),
            )?;
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::builder(router)
        .middleware(registry)
        .build()
        .unwrap();

    assert_eq!(dispatcher.dispatch_uri("/public").status, 200);

    let res = dispatcher.dispatch_uri("/admin/me");
    assert_eq!(res.status, 401);
    assert_eq!(res.get_header("www-authenticate"), Some("Bearer"));

    let res = dispatcher
        .dispatch(HandlerRequest::get("/admin/me").with_header("Authorization", "Bearer wrong"));
    assert_eq!(res.status, 401);

    let res = dispatcher
        .dispatch(HandlerRequest::get("/admin/me").with_header("Authorization", "bearer s3cret"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "alice");
}

#[test]
fn test_cors_preflight_and_decoration() {
    let mut router = Router::new();
    router.set_global_middleware(vec!["cors".into()]);
    router.get("data", text("payload")).unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();

    // no OPTIONS route: answered by the global pipeline before the 405
    let res = dispatcher.dispatch(
        HandlerRequest::new(Method::OPTIONS, "/data")
            .with_header("Origin", "https://app.test")
            .with_header("Access-Control-Request-Method", "GET"),
    );
    assert_eq!(res.status, 204);
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
    assert!(res
        .get_header("access-control-allow-methods")
        .unwrap()
        .contains("GET"));

    let res = dispatcher.dispatch(HandlerRequest::get("/data").with_header("Origin", "https://app.test"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "payload");
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
}

#[test]
fn test_error_boundary_catches_panics() {
    let _tracing = TestTracing::init();
    let mut router = Router::new();
    router.set_global_middleware(vec!["error_boundary".into()]);
    router
        .get(
            "explode",
            Action::positional(|_args| -> anyhow::Result<HandlerResponse> { panic!("kaboom") }),
        )
        .unwrap();
    router.get("fine", text("ok")).unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();

    let res = dispatcher.dispatch_uri("/explode");
    assert_eq!(res.status, 500);
    assert!(res.body.contains("kaboom"));

    // the dispatcher keeps working afterwards
    assert_eq!(dispatcher.dispatch_uri("/fine").body, "ok");
    assert_eq!(dispatcher.last_status(), Some(200));
}

#[test]
fn test_metrics_counts_every_outcome() {
    let metrics = Arc::new(MetricsMiddleware::new());
    let mut registry = MiddlewareRegistry::with_builtins();
    registry.register_instance("metrics", Arc::<MetricsMiddleware>::clone(&metrics));

    let mut router = Router::new();
    router.set_global_middleware(vec!["metrics".into(), "tracing".into()]);
    router.get("ok", text("ok")).unwrap();
    let dispatcher = Dispatcher::builder(router)
        .middleware(registry)
        .build()
        .unwrap();

    dispatcher.dispatch_uri("/ok");
    dispatcher.dispatch_uri("/missing");
    dispatcher.dispatch(HandlerRequest::new(Method::DELETE, "/ok"));

    assert_eq!(metrics.request_count(), 3);
    assert_eq!(metrics.client_errors(), 2);
    assert_eq!(metrics.server_errors(), 0);
    assert!(metrics.average_latency().as_nanos() > 0);
}

#[test]
fn test_unknown_middleware_fails_build() {
    let mut router = Router::new();
    router
        .add(&[Method::GET], "x", text("x"), vec!["does_not_exist".into()])
        .unwrap();
    let err = Dispatcher::builder(router).build().unwrap_err();
    assert_eq!(err, RouterError::UnknownMiddleware("does_not_exist".to_string()));
    assert!(err.is_registration_error());
}

#[test]
fn test_named_middleware_is_instantiated_once() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let mut registry = MiddlewareRegistry::new();
    registry.register("counted", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        from_fn("counted", |req, res, next| next(req, res))
    });

    let mut router = Router::new();
    router.set_global_middleware(vec!["counted".into()]);
    router
        .add(&[Method::GET], "a", text("a"), vec!["counted".into()])
        .unwrap();
    router
        .add(&[Method::GET], "b", text("b"), vec!["counted".into()])
        .unwrap();
    let dispatcher = Dispatcher::builder(router)
        .middleware(registry)
        .build()
        .unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.dispatch_uri("/b").body, "b");
}

#[test]
fn test_pipeline_runs_standalone() {
    let pipeline = Pipeline::new(vec![appender("outer"), appender("inner")]);
    assert_eq!(pipeline.names(), vec!["outer", "inner"]);

    let mut req = HandlerRequest::get("/");
    let res = pipeline.run(&mut req, HandlerResponse::default(), &|_req, _res| {
        HandlerResponse::ok("core")
    });
    assert_eq!(res.body, "core|inner|outer");

    let empty = Pipeline::default();
    assert!(empty.is_empty());
    let res = empty.run(&mut req, HandlerResponse::default(), &|_req, res| res);
    assert_eq!(res.status, 200);
}

#[test]
fn test_middleware_ref_labels() {
    let named = MiddlewareRef::from("cors");
    assert_eq!(named.label(), "cors");
    let inline = MiddlewareRef::from(appender("stamp"));
    assert_eq!(inline.label(), "stamp");
    assert!(MiddlewareRegistry::with_builtins().contains("error_boundary"));
    assert!(!MiddlewareRegistry::with_builtins().contains("auth"));
}
