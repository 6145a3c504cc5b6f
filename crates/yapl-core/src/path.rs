//! Dotted-path lookup and directive argument parsing
//!
//! ## Dotted paths
//!
//! `user.profile.name` walks nested objects key by key. A segment that is a
//! canonical decimal index (`items.0`) indexes into an array, and `length` on
//! an array yields its element count. Anything else resolves to absent:
//!
//! ```rust
//! use serde_json::json;
//! use yapl_core::path::get_path;
//!
//! let vars = json!({"user": {"name": "Ada"}, "items": ["a", "b"]});
//! let vars = vars.as_object().unwrap();
//!
//! assert_eq!(get_path(vars, "user.name").as_deref(), Some(&json!("Ada")));
//! assert_eq!(get_path(vars, "items.1").as_deref(), Some(&json!("b")));
//! assert_eq!(get_path(vars, "items.length").as_deref(), Some(&json!(2)));
//! assert!(get_path(vars, "user.name.first").is_none());
//! ```
//!
//! ## Template references
//!
//! Identifiers handed out by a resolver are opaque strings (filesystem paths
//! or URLs); [`dirname`] treats both `/` and `\` as separators.

use serde_json::Value;
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use crate::value::{number_value, parse_numeric_literal, Vars};

/// Resolve a dotted path against the variable context
pub fn get_path<'a>(vars: &'a Vars, dotted: &str) -> Option<Cow<'a, Value>> {
    let mut parts = dotted.split('.');
    let first = parts.next()?;
    let mut current = Cow::Borrowed(vars.get(first)?);

    for part in parts {
        current = match current {
            Cow::Borrowed(value) => step(value, part)?,
            // Only `length` produces an owned value, and numbers have no children
            Cow::Owned(_) => return None,
        };
    }

    Some(current)
}

fn step<'a>(value: &'a Value, part: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(map) => map.get(part).map(Cow::Borrowed),
        Value::Array(items) => {
            if part == "length" {
                return Some(Cow::Owned(Value::from(items.len())));
            }
            let index = parse_index(part)?;
            items.get(index).map(Cow::Borrowed)
        }
        _ => None,
    }
}

/// Canonical array index: "0", "12", never "01" or "+1"
fn parse_index(part: &str) -> Option<usize> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

/// Literal value of a quoted string (single or double quotes), if `text` is one
pub(crate) fn unquote(text: &str) -> Option<&str> {
    let quoted = (text.starts_with('"') && text.ends_with('"'))
        || (text.starts_with('\'') && text.ends_with('\''));
    if !quoted {
        return None;
    }
    Some(text.get(1..text.len() - 1).unwrap_or(""))
}

/// Parse a scalar operand: quoted string, number, `true`/`false`/`null`
///
/// Returns `None` when the text is not a literal (callers then treat it as a path).
pub(crate) fn parse_scalar_literal(text: &str) -> Option<Value> {
    if let Some(inner) = unquote(text) {
        return Some(Value::String(inner.to_string()));
    }
    if let Some(number) = parse_numeric_literal(text) {
        return Some(number_value(number));
    }
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" => Some(Value::Null),
        _ => None,
    }
}

/// Parse the object literal of `include "x" with {...}`
///
/// Keys may be bare or double-quoted. Values are quoted strings, numbers,
/// `true`/`false`/`null`, or dotted paths looked up in `parent` (absent
/// paths bind `null`). Entries that are not `key: value` pairs are skipped.
pub fn parse_with_object(literal: &str, parent: &Vars) -> Vars {
    let mut out = Vars::new();
    let trimmed = literal.trim();
    let inner = trimmed.strip_prefix('{').unwrap_or(trimmed);
    let inner = inner.strip_suffix('}').unwrap_or(inner);
    if inner.trim().is_empty() {
        return out;
    }

    for part in split_top_level_commas(inner) {
        let Some((key, raw)) = split_pair(&part) else {
            continue;
        };
        let value = parse_scalar_literal(raw)
            .or_else(|| get_path(parent, raw).map(Cow::into_owned))
            .unwrap_or(Value::Null);
        out.insert(key.to_string(), value);
    }

    out
}

/// Split on commas that are not inside a quoted string
fn split_top_level_commas(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for ch in inner.chars() {
        if let Some(quote) = in_string {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                in_string = Some(ch);
                current.push(ch);
            }
            ',' => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// `key: value` or `"key": value`, key in `[A-Za-z0-9_.-]+`
fn split_pair(part: &str) -> Option<(&str, &str)> {
    let (raw_key, raw_value) = part.split_once(':')?;
    let raw_key = raw_key.trim();
    let key = match raw_key.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"')?,
        None => raw_key,
    };
    let valid_key = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));
    let value = raw_value.trim();
    if !valid_key || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Extract every double-quoted entry of a `"a", "b"` list
pub fn parse_quoted_list(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = list;
    while let Some(open) = rest.find('"') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('"') else {
            break;
        };
        if close > 0 {
            items.push(after[..close].to_string());
            rest = &after[close + 1..];
        } else {
            // `""` is not an entry; its closing quote may open the next one
            rest = after;
        }
    }
    items
}

/// Directory part of a resolved identifier ("" when there is none)
pub fn dirname(identifier: &str) -> &str {
    match identifier.rfind(['/', '\\']) {
        Some(idx) => &identifier[..idx],
        None => "",
    }
}

/// Append `extension` to `reference` unless already present
pub fn ensure_extension(reference: &str, extension: &str) -> String {
    if extension.is_empty() || reference.ends_with(extension) {
        reference.to_string()
    } else {
        format!("{}{}", reference, extension)
    }
}

/// Check if path is absolute OR rooted (cross-platform)
///
/// Unlike `Path::is_absolute()`, this treats Windows rooted paths (`\tmp`)
/// as absolute too.
pub fn has_absolute_or_rooted_component(path: &Path) -> bool {
    if path.is_absolute() {
        return true;
    }

    path.components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Collapse `.` and `..` components without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !has_absolute_or_rooted_component(&out) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
