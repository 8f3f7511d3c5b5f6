//! Path template compilation.
//!
//! Templates mix literal text with `{name}` and `{name:type}` tokens, e.g.
//! `users/{id:int}/posts/{slug}`. Literal text is copied into the regex as-is,
//! so templates must only contain regex-safe literals.

use once_cell::sync::Lazy;
use regex::Regex;

use super::constraints::{ConstraintRegistry, DEFAULT_FRAGMENT};
use crate::error::RouterError;

/// `{name}` or `{name:type}`
pub(crate) static TOKEN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*([A-Za-z_][A-Za-z0-9_]*)\s*)?\}")
        .expect("token regex should be valid")
});

/// Output of [`compile_pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    /// Unanchored regex source
    pub source: String,
    /// Parameter names in encounter order
    pub param_names: Vec<String>,
    /// Parameter type names, `""` for untyped tokens
    pub param_types: Vec<String>,
}

impl CompiledPattern {
    /// A pattern without parameters only matches its own literal text
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.param_names.is_empty()
    }
}

/// Strip leading and trailing separators
#[must_use]
pub fn trim_separators(path: &str) -> &str {
    path.trim_matches('/')
}

/// Capture group name for the parameter at `index`.
///
/// Parameters are captured by name rather than position so that fragments
/// containing their own groups cannot shift later parameters.
#[must_use]
pub fn group_name(index: usize) -> String {
    format!("p{index}")
}

/// Compile a path template into an unanchored regex source plus its parameter
/// names and types.
pub fn compile_pattern(
    template: &str,
    constraints: &ConstraintRegistry,
) -> Result<CompiledPattern, RouterError> {
    let trimmed = trim_separators(template);
    if let Some(reason) = malformed(trimmed) {
        return Err(RouterError::InvalidPattern {
            pattern: template.to_string(),
            reason,
        });
    }

    let mut source = String::with_capacity(trimmed.len() + 16);
    let mut param_names = Vec::new();
    let mut param_types = Vec::new();
    let mut last = 0;

    for caps in TOKEN.captures_iter(trimmed) {
        let Some(whole) = caps.get(0) else { continue };
        source.push_str(&trimmed[last..whole.start()]);
        last = whole.end();

        let name = caps.get(1).map_or("", |m| m.as_str());
        let type_name = caps.get(2).map_or("", |m| m.as_str());
        let fragment = if type_name.is_empty() {
            DEFAULT_FRAGMENT
        } else {
            constraints.pattern_for(type_name).unwrap_or(DEFAULT_FRAGMENT)
        };

        source.push_str("(?P<");
        source.push_str(&group_name(param_names.len()));
        source.push('>');
        source.push_str(fragment);
        source.push(')');

        param_names.push(name.to_string());
        param_types.push(type_name.to_string());
    }
    source.push_str(&trimmed[last..]);

    Ok(CompiledPattern {
        source,
        param_names,
        param_types,
    })
}

/// Anchor and compile a regex source.
pub fn anchored(source: &str, template: &str) -> Result<Regex, RouterError> {
    Regex::new(&format!("^{source}$")).map_err(|e| RouterError::InvalidPattern {
        pattern: template.to_string(),
        reason: e.to_string(),
    })
}

/// Detect braces that look like a token but are not one.
fn malformed(template: &str) -> Option<String> {
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open..];
        match TOKEN.find(after) {
            Some(m) if m.start() == 0 => rest = &after[m.end()..],
            _ => {
                let close = after.find('}');
                let body = close.map(|c| &after[1..c]);
                match body {
                    None => return Some("unterminated '{'".to_string()),
                    // Regex repetition such as `a{2}` or `a{1,3}` is literal text
                    Some(b) if !b.is_empty() && b.chars().all(|c| c.is_ascii_digit() || c == ',') => {
                        rest = &after[1..];
                    }
                    Some(b) if b.trim().is_empty() => {
                        return Some("empty parameter name".to_string())
                    }
                    Some(b) => return Some(format!("invalid parameter token '{{{b}}}'")),
                }
            }
        }
    }
    None
}
