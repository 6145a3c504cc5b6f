//! Conversion rules for context values
//!
//! Variables are `serde_json::Value`s. Every place the engine needs to treat a
//! value as a boolean, a number, or text goes through this module so the rules
//! are applied uniformly:
//!
//! | Rule        | Falsy / zero / empty                                  |
//! |-------------|-------------------------------------------------------|
//! | truthiness  | absent, null, `false`, `0`, NaN, `""`                 |
//! | emptiness   | absent, null, `""`, `[]`, `{}`                        |
//! | numeric     | `true`→1, `false`/null/`""`→0, unparsable→NaN          |
//!
//! Empty arrays and objects are truthy but empty.

use serde_json::{Map, Number, Value};

/// Variable context: top-level bindings visible to a template
pub type Vars = Map<String, Value>;

/// Truthiness of a possibly-absent value
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => {
            let f = n.as_f64().unwrap_or(0.0);
            f != 0.0 && !f.is_nan()
        }
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Emptiness as tested by `is empty`
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}

/// Numeric coercion used by the ordering operators
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                parse_decimal(trimmed).unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// Strict equality: absent only equals absent, numbers compare numerically
pub fn strict_eq(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (None, _) | (_, None) => false,
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Some(a), Some(b)) => a == b,
    }
}

/// Text form used by interpolation
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Type name reported in type-mismatch errors
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a number value, keeping integral values integral
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 {
        Value::Number(Number::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Parse `-?\d+(\.\d+)?`
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
        return None;
    }
    text.parse().ok()
}

fn format_number(n: &Number) -> String {
    if n.is_f64() {
        let f = n.as_f64().unwrap_or(f64::NAN);
        if f.fract() == 0.0 && f.abs() < 1e21 {
            return format!("{}", f as i128);
        }
        return f.to_string();
    }
    n.to_string()
}

fn parse_decimal(text: &str) -> Option<f64> {
    // Rust accepts "inf"/"NaN" spellings that are not numbers here
    if text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
    {
        text.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness_follows_loose_rules() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!(-1.5))));
        // Empty containers are truthy
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
    }

    #[test]
    fn test_emptiness() {
        assert!(is_empty(None));
        assert!(is_empty(Some(&json!(null))));
        assert!(is_empty(Some(&json!(""))));
        assert!(is_empty(Some(&json!([]))));
        assert!(is_empty(Some(&json!({}))));
        assert!(!is_empty(Some(&json!(0))));
        assert!(!is_empty(Some(&json!(false))));
        assert!(!is_empty(Some(&json!([1]))));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(to_number(Some(&json!(true))), 1.0);
        assert_eq!(to_number(Some(&json!(false))), 0.0);
        assert_eq!(to_number(Some(&json!(null))), 0.0);
        assert_eq!(to_number(Some(&json!(" 42 "))), 42.0);
        assert_eq!(to_number(Some(&json!(""))), 0.0);
        assert!(to_number(Some(&json!("abc"))).is_nan());
        assert!(to_number(Some(&json!("inf"))).is_nan());
        assert!(to_number(Some(&json!([1]))).is_nan());
        assert!(to_number(None).is_nan());
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_eq(Some(&json!(1)), Some(&json!(1.0))));
        assert!(strict_eq(Some(&json!("a")), Some(&json!("a"))));
        assert!(!strict_eq(Some(&json!("1")), Some(&json!(1))));
        assert!(strict_eq(None, None));
        assert!(!strict_eq(None, Some(&json!(null))));
        assert!(strict_eq(Some(&json!(null)), Some(&json!(null))));
    }

    #[test]
    fn test_text_form() {
        assert_eq!(to_text(&json!("plain")), "plain");
        assert_eq!(to_text(&json!(3)), "3");
        assert_eq!(to_text(&json!(3.0)), "3");
        assert_eq!(to_text(&json!(4.5)), "4.5");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!(null)), "");
        assert_eq!(to_text(&json!(["a", 1, null])), "a,1,");
        assert_eq!(to_text(&json!({"k": "v"})), r#"{"k":"v"}"#);
    }

    #[test]
    fn test_parse_numeric_literal() {
        assert_eq!(parse_numeric_literal("90"), Some(90.0));
        assert_eq!(parse_numeric_literal("-2.5"), Some(-2.5));
        assert_eq!(parse_numeric_literal("2."), None);
        assert_eq!(parse_numeric_literal(".5"), None);
        assert_eq!(parse_numeric_literal("1e3"), None);
        assert_eq!(parse_numeric_literal("abc"), None);
    }

    #[test]
    fn test_number_value_keeps_integers_integral() {
        assert_eq!(number_value(3.0), json!(3));
        assert_eq!(number_value(4.5), json!(4.5));
    }
}
