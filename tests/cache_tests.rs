use http::Method;
use railyard::cache::{source_hash, RouteCache, CACHE_VERSION};
use railyard::handler::Action;
use railyard::manifest::load_router;
use railyard::middleware::from_fn;
use railyard::router::{GroupOptions, Router};
use railyard::RouterError;
use serde_json::json;

mod common;
use common::temp_files::create_temp_yaml;
use common::tracing_util::TestTracing;

const MANIFEST: &str = r#"
constraints:
  lang: "en|fr"
middleware: [error_boundary]
routes:
  - path: /
    handler: Home
    name: home
  - prefix: "{lang:lang}"
    tag: localized
    middleware: [cors]
    routes:
      - path: pages/{slug:slug}
        handler: Pages@show
        name: pages.show
      - method: delete
        path: pages/{slug:slug}
        handler: Pages@destroy
"#;

fn sample_router() -> Router {
    let mut router = Router::new();
    router.constraints_mut().register("lang", "en|fr");
    router.set_global_middleware(vec!["tracing".into()]);
    router
        .group(
            GroupOptions::prefix("{lang:lang}").tag("localized").middleware("cors"),
            |r| {
                r.get("docs/{page:int}", "Docs@show")?.name("docs.show")?;
                r.post("docs", "Docs@store")?;
                Ok(())
            },
        )
        .unwrap();
    router
}

#[test]
fn test_export_import_preserves_matching_and_names() {
    let original = sample_router();
    let cache = original.export("abc123").unwrap();
    assert_eq!(cache.version, CACHE_VERSION);
    assert_eq!(cache.source_hash, "abc123");
    assert_eq!(cache.constraints.get("lang").map(String::as_str), Some("en|fr"));
    assert_eq!(cache.global_middleware, vec!["tracing"]);
    assert_eq!(cache.routes[0].middleware, vec!["cors"]);

    let mut restored = Router::new();
    restored.import(&cache).unwrap();
    assert_eq!(restored.len(), original.len());
    assert_eq!(restored.constraints().pattern_for("lang"), Some("en|fr"));
    assert_eq!(restored.global_middleware().len(), 1);

    let m = restored.find(&Method::GET, "fr/docs/0042").unwrap();
    assert_eq!(m.get_path_param("lang"), Some(&json!("fr")));
    assert_eq!(m.get_path_param("page"), Some(&json!(42)));
    assert_eq!(m.route.group_tag.as_deref(), Some("localized"));
    assert_eq!(m.route.handler.label(), "Docs@show");
    assert!(restored.find(&Method::GET, "de/docs/1").is_none());

    assert_eq!(
        restored
            .url("docs.show", &[("lang", json!("en")), ("page", json!(3))], &[], None)
            .unwrap(),
        "/en/docs/3"
    );
}

#[test]
fn test_inline_values_are_not_cacheable() {
    let mut router = Router::new();
    router
        .get("inline", Action::positional(|_| Ok(Default::default())))
        .unwrap();
    assert!(matches!(
        router.export("h"),
        Err(RouterError::NotCacheable(_))
    ));

    let mut router = Router::new();
    router
        .add(
            &[Method::GET],
            "mw",
            "Pages@show",
            vec![from_fn("stamp", |req, res, next| next(req, res)).into()],
        )
        .unwrap();
    let err = router.export("h").unwrap_err();
    assert!(err.to_string().contains("inline middleware 'stamp'"));
}

#[test]
fn test_cache_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("routes.json");
    let cache = sample_router().export("hash").unwrap();
    cache.write(&path).unwrap();

    let read = RouteCache::read(&path).unwrap();
    assert!(read.matches("hash"));
    assert!(!read.matches("other"));
    assert_eq!(read.routes.len(), cache.routes.len());
}

#[test]
fn test_load_router_writes_then_reuses_cache() {
    let _tracing = TestTracing::init();
    let manifest = create_temp_yaml(MANIFEST);
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("routes.cache.json");

    // miss: compiled from the manifest and written out
    let router = load_router(manifest.path(), Some(&cache_path)).unwrap();
    assert_eq!(router.len(), 3);
    let cache = RouteCache::read(&cache_path).unwrap();
    assert_eq!(cache.source_hash, source_hash(MANIFEST.as_bytes()));

    // hit: tamper with the cache to prove it is what gets loaded
    let mut tampered = cache.clone();
    tampered.routes[0].name = Some("landing".to_string());
    tampered.write(&cache_path).unwrap();
    let router = load_router(manifest.path(), Some(&cache_path)).unwrap();
    assert!(router.routes().by_name("landing").is_some());
    assert!(router.routes().by_name("home").is_none());
    assert!(router.find(&Method::DELETE, "en/pages/about").is_some());
}

#[test]
fn test_stale_cache_is_rebuilt() {
    let manifest = create_temp_yaml(MANIFEST);
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("routes.cache.json");

    let mut stale = sample_router().export("not-the-manifest").unwrap();
    stale.routes.clear();
    stale.write(&cache_path).unwrap();

    let router = load_router(manifest.path(), Some(&cache_path)).unwrap();
    assert_eq!(router.len(), 3);
    assert!(router.routes().by_name("pages.show").is_some());
    assert!(RouteCache::read(&cache_path)
        .unwrap()
        .matches(&source_hash(MANIFEST.as_bytes())));
}

#[test]
fn test_unreadable_cache_is_ignored() {
    let manifest = create_temp_yaml(MANIFEST);
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("routes.cache.json");
    std::fs::write(&cache_path, "{ not json").unwrap();

    let router = load_router(manifest.path(), Some(&cache_path)).unwrap();
    assert_eq!(router.len(), 3);
    assert!(RouteCache::read(&cache_path).is_ok());
}

#[test]
fn test_load_router_without_cache() {
    let manifest = create_temp_yaml(MANIFEST);
    let router = load_router(manifest.path(), None).unwrap();
    assert_eq!(router.global_middleware().len(), 1);
    assert!(router.find(&Method::GET, "/").is_some());
}
