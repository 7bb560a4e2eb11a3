//! `{{path}}` token substitution against a JSON context.
//!
//! This is a hand-rolled resolver rather than a templating crate: the
//! spec requires a single whole-string token to return the *raw* JSON
//! value it resolves to (a mapping or list, untouched), which no
//! string-templating library can express since they always render to
//! text. See DESIGN.md for the precedent in this codebase for bespoke
//! JSON-path resolution over a general templating engine.

use serde_json::Value;

/// Recursively resolves `{{path}}` tokens in every string found inside
/// `value` (descending through objects and arrays), against `context`.
/// Non-string leaves pass through unchanged.
pub fn eval_value(value: &Value, context: &Value) -> Value {
    match value {
        Value::String(s) => eval_string(s, context),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| eval_value(v, context)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), eval_value(v, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Resolves tokens in a single string.
///
/// - No tokens: the string passes through unchanged.
/// - Exactly one token spanning the whole string: returns the resolved
///   value verbatim (may be a mapping, list, number, etc). Falls back to
///   the literal string if resolution fails.
/// - Any other case (multiple tokens, or a token embedded in text):
///   every resolvable token is stringified and substituted in place;
///   unresolved tokens are left as the literal `{{path}}` text.
pub fn eval_string(s: &str, context: &Value) -> Value {
    let tokens = find_tokens(s);
    if tokens.is_empty() {
        return Value::String(s.to_string());
    }

    if tokens.len() == 1 {
        let (start, end, path) = &tokens[0];
        if *start == 0 && *end == s.len() {
            return match resolve_path(path, context) {
                Some(v) => v,
                None => Value::String(s.to_string()),
            };
        }
    }

    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (start, end, path) in &tokens {
        out.push_str(&s[last..*start]);
        match resolve_path(path, context) {
            Some(v) => out.push_str(&stringify(&v)),
            None => out.push_str(&s[*start..*end]),
        }
        last = *end;
    }
    out.push_str(&s[last..]);
    Value::String(out)
}

/// Finds `{{...}}` occurrences as `(start, end_exclusive, trimmed_path)`.
/// An unterminated `{{` stops the scan rather than erroring.
fn find_tokens(s: &str) -> Vec<(usize, usize, String)> {
    let mut tokens = Vec::new();
    let mut search_from = 0;
    while let Some(rel_start) = s[search_from..].find("{{") {
        let start = search_from + rel_start;
        let after_open = start + 2;
        match s[after_open..].find("}}") {
            Some(rel_end) => {
                let end = after_open + rel_end + 2;
                let inner = s[after_open..after_open + rel_end].trim().to_string();
                tokens.push((start, end, inner));
                search_from = end;
            }
            None => break,
        }
    }
    tokens
}

/// Descends `path` (dot-separated, with optional `name[i]` list indexing
/// segments) against `context`. `None` on any missing key, wrong-typed
/// container, or out-of-range index.
fn resolve_path(path: &str, context: &Value) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = context.clone();
    for segment in path.split('.') {
        current = resolve_segment(segment, &current)?;
    }
    Some(current)
}

fn resolve_segment(segment: &str, current: &Value) -> Option<Value> {
    if let Some(bracket_pos) = segment.find('[') {
        if !segment.ends_with(']') || bracket_pos == 0 {
            return None;
        }
        let name = &segment[..bracket_pos];
        let idx_str = &segment[bracket_pos + 1..segment.len() - 1];
        let idx: usize = idx_str.parse().ok()?;
        let list_val = current.as_object()?.get(name)?;
        list_val.as_array()?.get(idx).cloned()
    } else {
        current.as_object()?.get(segment).cloned()
    }
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_string_token_returns_raw_value() {
        let ctx = json!({ "who": { "name": "ada" } });
        let resolved = eval_string("{{who}}", &ctx);
        assert_eq!(resolved, json!({ "name": "ada" }));
    }

    #[test]
    fn embedded_token_stringifies() {
        let ctx = json!({ "who": "world" });
        let resolved = eval_string("hello {{who}}", &ctx);
        assert_eq!(resolved, json!("hello world"));
    }

    #[test]
    fn list_indexing() {
        let ctx = json!({ "items": ["a", "b", "c"] });
        let resolved = eval_string("{{items[1]}}", &ctx);
        assert_eq!(resolved, json!("b"));
    }

    #[test]
    fn unresolvable_token_left_in_place() {
        let ctx = json!({});
        let resolved = eval_string("value: {{missing.path}}", &ctx);
        assert_eq!(resolved, json!("value: {{missing.path}}"));
    }

    #[test]
    fn idempotent_on_successful_resolution() {
        let ctx = json!({ "who": "world" });
        let once = eval_string("hello {{who}}", &ctx);
        let once_s = once.as_str().unwrap();
        let twice = eval_string(once_s, &ctx);
        assert_eq!(once, twice);
    }

    #[test]
    fn recurses_through_nested_structures() {
        let ctx = json!({ "who": "world" });
        let cfg = json!({ "greet": "hi {{who}}", "nested": ["{{who}}"] });
        let out = eval_value(&cfg, &ctx);
        assert_eq!(out, json!({ "greet": "hi world", "nested": ["world"] }));
    }
}
