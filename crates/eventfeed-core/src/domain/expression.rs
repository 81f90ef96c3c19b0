//! Placeholder expressions evaluated against event payloads.
//!
//! An expression is literal text with `{{ path }}` placeholders. A path is a
//! dotted walk into the payload (`venue.name`, `tags.0`). Resolution order:
//!
//! 1. `_index_` is the 1-based position of the event in the list being sorted.
//! 2. The payload path.
//! 3. Event metadata: `id`, `source_id`, `created_at` (RFC 3339).
//!
//! Anything unresolved renders as the empty string.

use std::sync::OnceLock;

use eventfeed_state::Event;
use regex::{Captures, Regex};
use serde_json::Value;

/// Reserved placeholder for the candidate position.
pub const INDEX_VAR: &str = "_index_";

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}")
            .unwrap_or_else(|e| unreachable!("placeholder pattern is valid: {e}"))
    })
}

/// Walk a dotted path into a JSON value.
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn resolve(path: &str, event: &Event, index: Option<usize>) -> String {
    if path == INDEX_VAR {
        return index.map(|i| i.to_string()).unwrap_or_default();
    }
    if let Some(value) = lookup(&event.payload, path) {
        return value_text(value);
    }
    match path {
        "id" => event.id.to_string(),
        "source_id" => event.source_id.to_string(),
        "created_at" => event.created_at.to_rfc3339(),
        _ => String::new(),
    }
}

/// Evaluate `expression` for one event.
pub fn interpolate(expression: &str, event: &Event, index: Option<usize>) -> String {
    placeholder()
        .replace_all(expression, |caps: &Captures<'_>| {
            resolve(&caps[1], event, index)
        })
        .into_owned()
}
