//! Condition and loop-source evaluation
//!
//! Conditions are tried in a fixed order and the first form that matches
//! decides the result:
//!
//! 1. `<a> and <b>`, then `<a> or <b>` (split at the first operator)
//! 2. `<path> is [not] defined`
//! 3. `<path> is [not] empty`
//! 4. `<lhs> OP <rhs>` with `OP` one of `>= <= == != > <`
//! 5. `true` / `false`
//! 6. a bare dotted path, tested for truthiness
//!
//! Anything else is false. Evaluation never fails.

use serde_json::Value;
use std::borrow::Cow;

use crate::error::{Result, TemplateError};
use crate::path::{get_path, parse_scalar_literal, unquote};
use crate::value::{is_empty, is_truthy, number_value, strict_eq, to_number, type_name, Vars};

const COMPARISON_OPERATORS: [&str; 6] = [">=", "<=", "==", "!=", ">", "<"];

/// Evaluate an `if`/`elseif` condition against the context
pub fn evaluate_condition(condition: &str, vars: &Vars) -> bool {
    let trimmed = condition.trim();

    if let Some((left, right)) = split_logical(trimmed, "and") {
        return evaluate_condition(left, vars) && evaluate_condition(right, vars);
    }
    if let Some((left, right)) = split_logical(trimmed, "or") {
        return evaluate_condition(left, vars) || evaluate_condition(right, vars);
    }

    if let Some((path, negated)) = parse_is_test(trimmed, "defined") {
        let defined = !matches!(get_path(vars, path).as_deref(), None | Some(Value::Null));
        return defined != negated;
    }
    if let Some((path, negated)) = parse_is_test(trimmed, "empty") {
        let empty = is_empty(get_path(vars, path).as_deref());
        return empty != negated;
    }

    if let Some((left, operator, right)) = split_comparison(trimmed) {
        let left = resolve_operand(left, vars);
        let right = resolve_operand(right, vars);
        return compare(left.as_deref(), operator, right.as_deref());
    }

    match trimmed {
        "true" => true,
        "false" => false,
        path if is_simple_path(path) => is_truthy(get_path(vars, path).as_deref()),
        _ => false,
    }
}

/// Evaluate the source expression of a `for` loop
///
/// A dotted path that is absent or null iterates zero times. Bracketed
/// literals are parsed as JSON, or else as a comma list where quoted items
/// are strings, numeric items are numbers, and everything else stays text.
pub fn evaluate_iterable(expression: &str, vars: &Vars) -> Result<Vec<Value>> {
    let expression = expression.trim();

    if !is_simple_path(expression) && expression.starts_with('[') && expression.ends_with(']') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(expression) {
            return Ok(items);
        }
        return Ok(parse_list_literal(&expression[1..expression.len() - 1]));
    }

    match get_path(vars, expression).as_deref() {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(TemplateError::TypeMismatch {
            expression: expression.to_string(),
            found: type_name(other).to_string(),
        }),
    }
}

fn parse_list_literal(inner: &str) -> Vec<Value> {
    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            if let Some(text) = unquote(item) {
                return Value::String(text.to_string());
            }
            let number = to_number(Some(&Value::String(item.to_string())));
            if number.is_nan() {
                Value::String(item.to_string())
            } else {
                number_value(number)
            }
        })
        .collect()
}

/// `[a-zA-Z0-9_.]+`
pub(crate) fn is_simple_path(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
}

/// Split `<left> <keyword> <right>` at the first keyword surrounded by whitespace
fn split_logical<'a>(text: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    for (idx, ch) in text.char_indices().skip(1) {
        if !ch.is_whitespace() {
            continue;
        }
        let after_space = text[idx..].trim_start();
        let Some(after_keyword) = after_space.strip_prefix(keyword) else {
            continue;
        };
        if !after_keyword.starts_with(char::is_whitespace) {
            continue;
        }
        let right = after_keyword.trim_start();
        if right.is_empty() {
            continue;
        }
        return Some((&text[..idx], right));
    }
    None
}

/// `<path> is [not] <test>`, returning the path and whether it is negated
fn parse_is_test<'a>(text: &'a str, test: &str) -> Option<(&'a str, bool)> {
    let rest = text.strip_suffix(test)?;
    let rest = strip_word_suffix(rest)?;
    let (rest, negated) = match rest.strip_suffix("not").and_then(strip_word_suffix) {
        Some(before_not) => (before_not, true),
        None => (rest, false),
    };
    let path = strip_word_suffix(rest.strip_suffix("is")?)?;
    if path.is_empty() {
        return None;
    }
    Some((path, negated))
}

/// Require at least one trailing whitespace character and drop the run
fn strip_word_suffix(text: &str) -> Option<&str> {
    let trimmed = text.trim_end();
    (trimmed.len() < text.len()).then_some(trimmed)
}

/// Split `<lhs> OP <rhs>` at the first position where an operator fits
fn split_comparison(text: &str) -> Option<(&str, &'static str, &str)> {
    for (idx, _) in text.char_indices().skip(1) {
        let candidate = text[idx..].trim_start();
        for operator in COMPARISON_OPERATORS {
            let Some(right) = candidate.strip_prefix(operator) else {
                continue;
            };
            let right = right.trim();
            if !right.is_empty() {
                return Some((text[..idx].trim(), operator, right));
            }
        }
    }
    None
}

/// Literal operand, or a dotted-path lookup (`None` when absent)
fn resolve_operand<'a>(expr: &str, vars: &'a Vars) -> Option<Cow<'a, Value>> {
    match parse_scalar_literal(expr) {
        Some(literal) => Some(Cow::Owned(literal)),
        None => get_path(vars, expr),
    }
}

fn compare(left: Option<&Value>, operator: &str, right: Option<&Value>) -> bool {
    match operator {
        "==" => strict_eq(left, right),
        "!=" => !strict_eq(left, right),
        ordering => {
            let (l, r) = (to_number(left), to_number(right));
            match ordering {
                ">=" => l >= r,
                "<=" => l <= r,
                ">" => l > r,
                "<" => l < r,
                _ => false,
            }
        }
    }
}
