use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::Value;

use crate::dispatcher::{override_verb, split_uri};
use crate::manifest::load_router;
use crate::router::{DispatchOutcome, UrlContext};

/// Inspect and exercise route manifests
#[derive(Debug, Parser)]
#[command(name = "railyard")]
#[command(about = "Railyard route table CLI", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Route cache to read (and refresh when stale)
    #[arg(long, global = true, env = "RAILYARD_ROUTE_CACHE")]
    pub cache: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every route in registration order
    Routes {
        /// Path to the YAML route manifest
        manifest: PathBuf,
    },
    /// Match a request against the route table
    Match {
        /// Path to the YAML route manifest
        manifest: PathBuf,
        /// Request method as sent on the wire
        method: String,
        /// Request target, query string allowed
        uri: String,
        /// Override verb carried by a POST
        #[arg(long = "override")]
        override_method: Option<String>,
    },
    /// Generate the URL of a named route
    Url {
        /// Path to the YAML route manifest
        manifest: PathBuf,
        /// Route name
        name: String,
        /// Route parameters as key=value
        params: Vec<String>,
        /// Query parameters as key=value (repeatable)
        #[arg(long)]
        query: Vec<String>,
        /// Host for an absolute URL
        #[arg(long)]
        absolute: Option<String>,
        /// Scheme for an absolute URL
        #[arg(long, default_value = "http")]
        scheme: String,
    },
    /// Compile the manifest and write a route cache
    Cache {
        /// Path to the YAML route manifest
        manifest: PathBuf,
        /// Cache file to write
        out: PathBuf,
    },
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| anyhow!("expected key=value, got '{raw}'"))
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method '{raw}'"))
}

/// Parse arguments from the process and run.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

/// Run a parsed command, writing its report to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let cache = cli.cache.as_deref();
    match cli.command {
        Commands::Routes { manifest } => routes(&manifest, cache, out),
        Commands::Match {
            manifest,
            method,
            uri,
            override_method,
        } => match_request(&manifest, cache, &method, &uri, override_method.as_deref(), out),
        Commands::Url {
            manifest,
            name,
            params,
            query,
            absolute,
            scheme,
        } => {
            let router = load_router(&manifest, cache)?;
            let params = params
                .iter()
                .map(|p| split_pair(p).map(|(k, v)| (k, Value::String(v.to_string()))))
                .collect::<Result<Vec<_>>>()?;
            let query = query
                .iter()
                .map(String::as_str)
                .map(split_pair)
                .collect::<Result<Vec<_>>>()?;
            let ctx = absolute.map(|host| UrlContext::new(scheme, host));
            let url = router.url(&name, &params, &query, ctx.as_ref())?;
            writeln!(out, "{url}")?;
            Ok(())
        }
        Commands::Cache { manifest, out: path } => {
            let raw = std::fs::read(&manifest)
                .with_context(|| format!("Failed to read route manifest {}", manifest.display()))?;
            let router = load_router(&manifest, None)?;
            let route_cache = router.export(&crate::cache::source_hash(&raw))?;
            route_cache.write(&path)?;
            writeln!(out, "wrote {} routes to {}", route_cache.routes.len(), path.display())?;
            Ok(())
        }
    }
}

fn routes(manifest: &Path, cache: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let router = load_router(manifest, cache)?;
    router.write_routes(out)?;
    Ok(())
}

fn match_request(
    manifest: &Path,
    cache: Option<&Path>,
    method: &str,
    uri: &str,
    override_method: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let router = load_router(manifest, cache)?;
    let method = parse_method(method)?;
    let over = match override_method {
        Some(raw) => {
            let verb = override_verb(&method, raw);
            if verb.is_none() {
                bail!("'{raw}' is not a valid override for {method}");
            }
            verb
        }
        None => None,
    };
    let (path, _) = split_uri(uri);

    match router.resolve(&method, &path, over.as_ref()) {
        DispatchOutcome::Matched(m) => {
            writeln!(out, "matched {}", m.route)?;
            if m.method != method {
                writeln!(out, "effective method: {}", m.method)?;
            }
            for (name, value) in &m.path_params {
                writeln!(out, "  {name} = {value}")?;
            }
        }
        DispatchOutcome::MethodMismatch(allowed) => {
            let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            writeln!(out, "405 method not allowed (allowed: {})", allowed.join(", "))?;
        }
        DispatchOutcome::NoMatch => writeln!(out, "404 no route matches")?,
    }
    Ok(())
}
