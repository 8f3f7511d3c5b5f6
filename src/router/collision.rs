//! Registration-time collision detection.
//!
//! Two kinds of overlap are rejected for routes sharing at least one method:
//!
//! 1. identical regex sources;
//! 2. a static route whose literal path is matched by the other route's regex
//!    (in either direction).
//!
//! Two different parameterized patterns that can match the same concrete path
//! (`a/{x:int}` and `a/{y}`) are not detected. Those are resolved at dispatch
//! time by registration order.

use tracing::warn;

use super::table::{CompiledRoute, RouteTable};
use crate::error::RouterError;

/// Check `candidate` against every registered route, in registration order.
/// The first conflict wins.
pub fn detect_collision(table: &RouteTable, candidate: &CompiledRoute) -> Result<(), RouterError> {
    for existing in table.iter() {
        let methods = candidate.shared_methods(existing);
        if methods.is_empty() {
            continue;
        }
        if overlaps(candidate, existing) {
            warn!(
                pattern = %candidate.pattern,
                existing_pattern = %existing.pattern,
                methods = ?methods,
                existing_name = ?existing.name,
                "Route registration conflict"
            );
            return Err(RouterError::RegistrationConflict {
                pattern: candidate.pattern.clone(),
                existing_pattern: existing.pattern.clone(),
                methods,
                existing_name: existing.name.clone(),
                group_tag: candidate.group_tag.clone(),
                existing_group_tag: existing.group_tag.clone(),
            });
        }
    }
    Ok(())
}

fn overlaps(a: &CompiledRoute, b: &CompiledRoute) -> bool {
    if a.source == b.source {
        return true;
    }
    (a.is_static() && b.regex.is_match(&a.source)) || (b.is_static() && a.regex.is_match(&b.source))
}
