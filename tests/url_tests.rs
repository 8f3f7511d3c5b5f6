use railyard::dispatcher::{Dispatcher, HandlerRequest};
use railyard::router::{GroupOptions, Router, UrlContext};
use railyard::{RouterConfig, RouterError};
use serde_json::json;

mod common;
use common::fixtures::{echo, echoed_params};

fn named_router() -> Router {
    let mut router = Router::new();
    router.get("a/{n:int}/{s:slug}", echo()).unwrap().name("pair").unwrap();
    router
        .group(GroupOptions::prefix("blog"), |r| {
            r.get("{year:int}/{title}", echo())?.name("blog.post")?;
            r.get("tags/{tag:slug}", echo())?.name("blog.tag")?;
            r.get("", echo())?.name("blog.index")
        })
        .unwrap();
    router
        .get("orders/{id:uuid}/{paid:bool}", echo())
        .unwrap()
        .name("orders.show")
        .unwrap();
    router
}

#[test]
fn test_generated_url_dispatches_back_to_same_params() {
    let router = named_router();
    let path = router
        .url("pair", &[("n", json!(7)), ("s", json!("hi"))], &[], None)
        .unwrap();
    assert_eq!(path, "/a/7/hi");

    let dispatcher = Dispatcher::builder(router).build().unwrap();
    let res = dispatcher.dispatch_uri(&path);
    assert_eq!(echoed_params(&res), json!({ "n": 7, "s": "hi" }));
    assert_eq!(res.json_body().unwrap()["route"], "pair");
}

#[test]
fn test_non_verbatim_values_are_percent_encoded() {
    let router = named_router();
    let url = router
        .url(
            "blog.post",
            &[("year", json!(2024)), ("title", json!("hello world/again"))],
            &[],
            None,
        )
        .unwrap();
    assert_eq!(url, "/blog/2024/hello%20world%2Fagain");

    let url = router
        .url("blog.tag", &[("tag", json!("café"))], &[], None)
        .unwrap();
    assert_eq!(url, "/blog/tags/caf%C3%A9");

    // decoded again on the way back in
    let dispatcher = Dispatcher::builder(router).build().unwrap();
    let res = dispatcher.dispatch_uri(&url);
    assert_eq!(echoed_params(&res), json!({ "tag": "café" }));
}

#[test]
fn test_verbatim_types() {
    let router = named_router();
    let id = "0f8fad5b-d9cb-469f-a165-70867728950e";
    let url = router
        .url("orders.show", &[("id", json!(id)), ("paid", json!(true))], &[], None)
        .unwrap();
    assert_eq!(url, format!("/orders/{id}/true"));
}

#[test]
fn test_null_param_is_missing() {
    let mut router = Router::new();
    router.get("users/{id:int}/posts", echo()).unwrap().name("u").unwrap();

    let err = router.url("u", &[("id", json!(null))], &[], None).unwrap_err();
    assert_eq!(
        err,
        RouterError::MissingRouteParams {
            route: "u".to_string(),
            missing: vec!["id".to_string()],
        }
    );
    assert_eq!(
        router.url("u", &[("id", json!(7))], &[], None).unwrap(),
        "/users/7/posts"
    );
}

#[test]
fn test_missing_params_are_all_reported() {
    let router = named_router();
    let err = router
        .url("blog.post", &[("unrelated", json!(1))], &[], None)
        .unwrap_err();
    assert_eq!(
        err,
        RouterError::MissingRouteParams {
            route: "blog.post".to_string(),
            missing: vec!["year".to_string(), "title".to_string()],
        }
    );
    assert_eq!(err.status(), 400);
}

#[test]
fn test_unknown_route_name() {
    let router = named_router();
    let err = router.url("nope", &[], &[], None).unwrap_err();
    assert_eq!(err, RouterError::UnknownRouteName("nope".to_string()));
}

#[test]
fn test_query_string_is_form_encoded() {
    let router = named_router();
    let url = router
        .url("blog.index", &[], &[("q", "rust & go"), ("page", "2")], None)
        .unwrap();
    assert_eq!(url, "/blog?q=rust+%26+go&page=2");
}

#[test]
fn test_absolute_urls() {
    let router = named_router();
    let ctx = UrlContext::new("https", "example.com/");
    let url = router
        .url("pair", &[("n", json!(1)), ("s", json!("x"))], &[], Some(&ctx))
        .unwrap();
    assert_eq!(url, "https://example.com/a/1/x");
}

#[test]
fn test_dispatcher_absolute_url_sources() {
    let params = [("n", json!(2)), ("s", json!("y"))];

    // nothing configured
    let dispatcher = Dispatcher::builder(named_router()).build().unwrap();
    assert_eq!(
        dispatcher.absolute_url("pair", &params, &[], None).unwrap(),
        "http://localhost/a/2/y"
    );

    // configured defaults
    let config = RouterConfig {
        default_scheme: "https".to_string(),
        default_host: Some("api.example.org".to_string()),
        ..RouterConfig::default()
    };
    let dispatcher = Dispatcher::builder(named_router())
        .config(config)
        .build()
        .unwrap();
    assert_eq!(
        dispatcher.absolute_url("pair", &params, &[], None).unwrap(),
        "https://api.example.org/a/2/y"
    );

    // request headers win
    let req = HandlerRequest::get("/")
        .with_header("Host", "internal:8080")
        .with_header("X-Forwarded-Host", "public.example.org")
        .with_header("X-Forwarded-Proto", "http");
    assert_eq!(
        dispatcher
            .absolute_url("pair", &params, &[("x", "1")], Some(&req))
            .unwrap(),
        "http://public.example.org/a/2/y?x=1"
    );

    assert_eq!(dispatcher.url("pair", &params, &[]).unwrap(), "/a/2/y");
}

#[test]
fn test_url_context_from_request() {
    let config = RouterConfig::default();
    let req = HandlerRequest::get("/").with_header("host", "shop.test");
    assert_eq!(
        UrlContext::from_request(&req, &config),
        Some(UrlContext::new("http", "shop.test"))
    );
    assert_eq!(UrlContext::from_request(&HandlerRequest::get("/"), &config), None);
    assert_eq!(UrlContext::from_config(&config), None);
}
