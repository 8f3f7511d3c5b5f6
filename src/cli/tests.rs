//! Unit tests for CLI commands

use std::io::Write;

use clap::Parser;

use crate::cli::{run, Cli, Commands};

const MANIFEST: &str = r#"
middleware: [error_boundary]
routes:
  - path: users/{id:int}
    handler: Users@show
    name: users.show
  - method: DELETE
    path: users/{id:int}
    handler: Users@destroy
  - path: tags/{tag:slug}
    handler: Tags@show
    name: tags.show
"#;

fn manifest_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn run_args(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run(cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_match_command_parses_override() {
    let cli = Cli::try_parse_from([
        "railyard",
        "match",
        "routes.yaml",
        "POST",
        "/users/1",
        "--override",
        "DELETE",
    ])
    .unwrap();
    match cli.command {
        Commands::Match {
            method,
            override_method,
            ..
        } => {
            assert_eq!(method, "POST");
            assert_eq!(override_method.as_deref(), Some("DELETE"));
        }
        other => panic!("Expected Match command, got {other:?}"),
    }
}

#[test]
fn test_url_command_collects_params_and_query() {
    let cli = Cli::try_parse_from([
        "railyard", "url", "routes.yaml", "users.show", "id=3", "--query", "a=1", "--query", "b=2",
    ])
    .unwrap();
    match cli.command {
        Commands::Url { params, query, .. } => {
            assert_eq!(params, vec!["id=3"]);
            assert_eq!(query, vec!["a=1", "b=2"]);
        }
        other => panic!("Expected Url command, got {other:?}"),
    }
}

#[test]
fn test_routes_lists_table() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let output = run_args(&["railyard", "routes", path]);
    assert!(output.starts_with("3 routes"));
    assert!(output.contains("global middleware: error_boundary"));
    assert!(output.contains("GET /users/{id:int} -> Users@show (users.show)"));
    assert!(output.contains("DELETE /users/{id:int} -> Users@destroy"));
}

#[test]
fn test_match_reports_params_and_override() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();

    let output = run_args(&["railyard", "match", path, "GET", "/users/007?x=1"]);
    assert!(output.contains("matched GET /users/{id:int}"));
    assert!(output.contains("id = 7"));

    let output = run_args(&[
        "railyard", "match", path, "POST", "/users/5", "--override", "delete",
    ]);
    assert!(output.contains("effective method: DELETE"));

    let output = run_args(&["railyard", "match", path, "PUT", "/users/5"]);
    assert!(output.contains("405"));
    assert!(output.contains("GET, DELETE"));

    let output = run_args(&["railyard", "match", path, "GET", "/nope"]);
    assert!(output.contains("404"));
}

#[test]
fn test_invalid_override_is_an_error() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let cli = Cli::try_parse_from([
        "railyard", "match", path, "GET", "/users/5", "--override", "DELETE",
    ])
    .unwrap();
    assert!(run(cli, &mut Vec::<u8>::new()).is_err());
}

#[test]
fn test_url_command_output() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let output = run_args(&[
        "railyard",
        "url",
        path,
        "tags.show",
        "tag=rust lang",
        "--query",
        "page=2",
        "--absolute",
        "example.com",
        "--scheme",
        "https",
    ]);
    assert_eq!(output.trim(), "https://example.com/tags/rust%20lang?page=2");
}

#[test]
fn test_cache_command_writes_file() {
    let file = manifest_file();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("routes.json");
    let output = run_args(&[
        "railyard",
        "cache",
        file.path().to_str().unwrap(),
        out.to_str().unwrap(),
    ]);
    assert!(output.contains("wrote 3 routes"));
    let cache = crate::cache::RouteCache::read(&out).unwrap();
    assert_eq!(cache.routes.len(), 3);
    assert_eq!(cache.global_middleware, vec!["error_boundary"]);
}
