//! # CLI Module
//!
//! Command-line access to route manifests.
//!
//! ## Commands
//!
//! ```bash
//! # List the route table
//! railyard routes routes.yaml
//!
//! # Match a request (POST overridden to DELETE)
//! railyard match routes.yaml POST /api/users/42 --override DELETE
//!
//! # Build a URL
//! railyard url routes.yaml users.show id=42 --query tab=posts
//! railyard url routes.yaml users.show id=42 --absolute example.com --scheme https
//!
//! # Precompile a route cache
//! railyard cache routes.yaml target/routes.json
//! ```
//!
//! Every command accepts `--cache <FILE>` (or `RAILYARD_ROUTE_CACHE`) to load
//! through a route cache.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run, run_cli, Cli, Commands};
