//! Cell values and column dtypes.

use std::fmt;

/// Column dtype, named the way the profile reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Object,
}

impl DType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Object => "object",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Hashable identity used for distinct counts and duplicate detection.
    #[must_use]
    pub fn key(&self) -> ValueKey<'_> {
        match self {
            Value::Missing => ValueKey::Missing,
            Value::Int(v) => ValueKey::Int(*v),
            Value::Float(v) => ValueKey::Float(canonical_bits(*v)),
            Value::Bool(v) => ValueKey::Bool(*v),
            Value::Text(v) => ValueKey::Text(v),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Missing => serde_json::Value::Null,
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Text(v) => serde_json::Value::String(v.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str("NaN"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey<'a> {
    Missing,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(&'a str),
}

fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::{DType, Value};

    #[test]
    fn signed_zero_shares_a_key() {
        assert_eq!(Value::Float(-0.0).key(), Value::Float(0.0).key());
    }

    #[test]
    fn non_finite_floats_are_null_in_json() {
        assert!(Value::Float(f64::INFINITY).to_json().is_null());
        assert_eq!(Value::Int(3).to_json(), serde_json::json!(3));
    }

    #[test]
    fn only_int_and_float_are_numeric() {
        assert!(DType::Int64.is_numeric());
        assert!(DType::Float64.is_numeric());
        assert!(!DType::Bool.is_numeric());
        assert!(!DType::Object.is_numeric());
    }
}
