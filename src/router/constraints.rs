//! Named path-segment constraints.
//!
//! A constraint couples a regex fragment (baked into a route's regex when the
//! route is compiled) with an optional converter (looked up by name every time
//! a matched segment is converted). Fragments are therefore early-bound and
//! converters late-bound: re-registering a converter changes conversions for
//! routes that were compiled before the change, re-registering a fragment does
//! not touch their regex.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

/// Converts a raw (still percent-encoded) path segment into a typed value
pub type Converter = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Permissive fragment used for untyped tokens and unknown type names
pub const DEFAULT_FRAGMENT: &str = "[^/]+";

/// One registry entry.
#[derive(Clone)]
pub struct ConstraintSpec {
    pub name: String,
    /// Regex fragment; `None` falls back to [`DEFAULT_FRAGMENT`]
    pub pattern: Option<String>,
    pub converter: Option<Converter>,
}

impl fmt::Debug for ConstraintSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintSpec")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

impl ConstraintSpec {
    fn builtin(name: &str, pattern: &str, converter: fn(&str) -> Value) -> Self {
        Self {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            converter: Some(Arc::new(converter)),
        }
    }
}

const PERCENT_BYTE: &str = "%[0-9A-Fa-f]{2}";

fn to_int(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn to_float(raw: &str) -> Value {
    raw.parse::<f64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn to_bool(raw: &str) -> Value {
    let lowered = raw.to_ascii_lowercase();
    Value::Bool(matches!(lowered.as_str(), "1" | "true" | "yes" | "on"))
}

fn percent_decoded(raw: &str) -> Value {
    match urlencoding::decode(raw) {
        Ok(decoded) => Value::String(decoded.into_owned()),
        Err(_) => Value::String(raw.to_string()),
    }
}

fn to_lower_uuid(raw: &str) -> Value {
    Value::String(raw.to_ascii_lowercase())
}

/// Built-in constraints, seeded once on first lookup.
static BUILTINS: Lazy<HashMap<&'static str, ConstraintSpec>> = Lazy::new(|| {
    let slug = format!("(?:[A-Za-z0-9-]|{PERCENT_BYTE})+");
    let alpha = format!("(?:[A-Za-z]|{PERCENT_BYTE})+");
    let alnum = format!("(?:[A-Za-z0-9]|{PERCENT_BYTE})+");
    let table: [(&'static str, String, fn(&str) -> Value); 7] = [
        ("int", "[0-9]+".to_string(), to_int),
        ("numeric", r"[0-9]+(?:\.[0-9]+)?".to_string(), to_float),
        ("bool", "(?i:true|false|1|0|yes|no|on|off)".to_string(), to_bool),
        ("slug", slug, percent_decoded),
        ("alpha", alpha, percent_decoded),
        ("alnum", alnum, percent_decoded),
        (
            "uuid",
            "(?i:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})".to_string(),
            to_lower_uuid,
        ),
    ];
    table
        .into_iter()
        .map(|(name, pattern, converter)| (name, ConstraintSpec::builtin(name, &pattern, converter)))
        .collect()
});

/// Type names whose values are emitted verbatim by URL generation.
pub(crate) fn is_verbatim_type(name: &str) -> bool {
    matches!(name, "int" | "numeric" | "bool" | "uuid")
}

/// Registry of named constraints.
///
/// Application registrations shadow built-ins of the same name.
#[derive(Clone, Default)]
pub struct ConstraintRegistry {
    custom: HashMap<String, ConstraintSpec>,
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ConstraintRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a constraint with a regex fragment and no converter.
    pub fn register(&mut self, name: &str, pattern: impl Into<String>) {
        self.insert(ConstraintSpec {
            name: name.to_string(),
            pattern: Some(pattern.into()),
            converter: None,
        });
    }

    /// Register (or replace) a constraint with both a fragment and a converter.
    pub fn register_with<F>(&mut self, name: &str, pattern: impl Into<String>, converter: F)
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        self.insert(ConstraintSpec {
            name: name.to_string(),
            pattern: Some(pattern.into()),
            converter: Some(Arc::new(converter)),
        });
    }

    /// Replace only the converter, keeping the current fragment (if any).
    pub fn register_converter<F>(&mut self, name: &str, converter: F)
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        let pattern = self.lookup(name).and_then(|spec| spec.pattern.clone());
        self.insert(ConstraintSpec {
            name: name.to_string(),
            pattern,
            converter: Some(Arc::new(converter)),
        });
    }

    /// Replace only the fragment, keeping the current converter (if any).
    pub fn register_pattern(&mut self, name: &str, pattern: impl Into<String>) {
        let converter = self.lookup(name).and_then(|spec| spec.converter.clone());
        self.insert(ConstraintSpec {
            name: name.to_string(),
            pattern: Some(pattern.into()),
            converter,
        });
    }

    /// Application registrations, in no particular order
    pub fn custom(&self) -> impl Iterator<Item = &ConstraintSpec> {
        self.custom.values()
    }

    fn insert(&mut self, spec: ConstraintSpec) {
        tracing::debug!(
            constraint = %spec.name,
            pattern = ?spec.pattern,
            has_converter = spec.converter.is_some(),
            "Constraint registered"
        );
        self.custom.insert(spec.name.clone(), spec);
    }

    /// Look up a constraint, custom registrations first.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ConstraintSpec> {
        self.custom.get(name).or_else(|| BUILTINS.get(name))
    }

    /// Regex fragment for a type name, `None` when unknown or fragment-less.
    #[must_use]
    pub fn pattern_for(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(|spec| spec.pattern.as_deref())
    }

    /// Convert a raw segment. Unknown types and converter-less types pass the
    /// raw string through unchanged.
    #[must_use]
    pub fn convert(&self, name: &str, raw: &str) -> Value {
        match self.lookup(name).and_then(|spec| spec.converter.as_ref()) {
            Some(converter) => converter(raw),
            None => Value::String(raw.to_string()),
        }
    }

    /// Every known type name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTINS
            .keys()
            .copied()
            .chain(self.custom.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
