//! Dynamic typing of CSV cells.
//!
//! With dynamic typing on, a cell becomes a JSON number, boolean or null when
//! its text has that shape; everything else stays a string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

/// Integer or floating-point lexical form, optionally with an exponent.
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").expect("valid float regex")
});

/// Largest magnitude converted to a number; beyond it precision is lost, so the cell stays text.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Convert a raw cell into a typed JSON value.
pub fn coerce(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if FLOAT.is_match(cell) {
        if let Some(n) = parse_number(cell.trim()) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}

fn parse_number(text: &str) -> Option<Number> {
    let is_integer = !text.contains(['.', 'e', 'E']);
    if is_integer {
        if let Ok(i) = text.parse::<i64>() {
            return (i.unsigned_abs() <= MAX_EXACT as u64).then(|| Number::from(i));
        }
    }

    let f = text.parse::<f64>().ok()?;
    if f.abs() > MAX_EXACT {
        return None;
    }
    Number::from_f64(f)
}
