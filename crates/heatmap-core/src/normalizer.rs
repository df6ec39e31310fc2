//! Code normalization.
//!
//! Every code goes through a float, then integer, then string coercion, so
//! `1010`, `1010.0` and `"1010.0"` all become `"1010"`. Fractions are
//! truncated toward zero. Anything that does not survive the coercion
//! (text, NaN, infinities, negative values, missing cells) normalizes to
//! `None`.

use crate::types::{OperationCode, RawCode};

/// Canonicalize a raw code.
pub fn normalize(raw: &RawCode) -> Option<OperationCode> {
    match raw {
        RawCode::Integer(value) => normalize_integer(*value),
        RawCode::Float(value) => normalize_float(*value),
        RawCode::Text(text) => normalize_str(text),
        RawCode::Missing => None,
    }
}

/// Canonicalize a code given as text.
pub fn normalize_str(text: &str) -> Option<OperationCode> {
    let value: f64 = text.trim().parse().ok()?;
    normalize_float(value)
}

/// Canonicalize a code given as a float.
pub fn normalize_float(value: f64) -> Option<OperationCode> {
    if !value.is_finite() {
        return None;
    }

    let truncated = value.trunc();
    if truncated < 0.0 {
        return None;
    }

    // `+ 0.0` folds -0.0 (from e.g. -0.5) into 0.0
    OperationCode::parse(&format!("{:.0}", truncated + 0.0))
}

/// Canonicalize a code given as an integer.
pub fn normalize_integer(value: i64) -> Option<OperationCode> {
    if value < 0 {
        return None;
    }
    OperationCode::parse(&value.to_string())
}
