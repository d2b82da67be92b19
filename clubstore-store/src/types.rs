//! Values exchanged with drivers.

use serde::Serialize;

/// A single column or parameter value.
///
/// This is the common denominator of what single-file stores hold; drivers
/// convert to and from their native representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Signed integer.
    Integer(i64),
    /// Floating point.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the variant, for conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    /// Parse an operator-typed literal: integers, reals and `null` are
    /// recognized, everything else is text.
    pub fn parse_literal(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("null") {
            Self::Null
        } else if let Ok(i) = raw.parse::<i64>() {
            Self::Integer(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                Self::Real(f)
            } else {
                Self::Text(raw.to_string())
            }
        } else {
            Self::Text(raw.to_string())
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::Text(s) => write!(f, "{}", s),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Error converting a [`Value`] into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot read {found} value as {expected}")]
pub struct FromValueError {
    /// Rust type that was requested.
    pub expected: &'static str,
    /// Variant that was found.
    pub found: &'static str,
}

impl FromValueError {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.type_name(),
        }
    }
}

/// Conversion from a borrowed [`Value`] into an owned Rust type.
pub trait FromValue: Sized {
    /// Convert the value.
    fn from_value(value: &Value) -> Result<Self, FromValueError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(FromValueError::new("i64", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Integer(i) => i32::try_from(*i).map_err(|_| FromValueError::new("i32", value)),
            other => Err(FromValueError::new("i32", other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Real(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(FromValueError::new("f64", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Integer(i) => Ok(*i != 0),
            other => Err(FromValueError::new("bool", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(FromValueError::new("String", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(FromValueError::new("Vec<u8>", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, FromValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(42i64), Value::Integer(42));
        assert_eq!(Value::from(7i32), Value::Integer(7));
        assert_eq!(Value::from(true), Value::Integer(1));
        assert_eq!(Value::from("Eagles"), Value::Text("Eagles".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3.5)), Value::Real(3.5));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(i64::from_value(&Value::Integer(2)), Ok(2));
        assert_eq!(bool::from_value(&Value::Integer(0)), Ok(false));
        assert_eq!(f64::from_value(&Value::Integer(2)), Ok(2.0));
        assert_eq!(
            Option::<String>::from_value(&Value::Null),
            Ok(None::<String>)
        );

        let err = String::from_value(&Value::Integer(1)).unwrap_err();
        assert_eq!(err.expected, "String");
        assert_eq!(err.found, "integer");
        assert!(i32::from_value(&Value::Integer(i64::MAX)).is_err());
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("12"), Value::Integer(12));
        assert_eq!(Value::parse_literal("-1.5"), Value::Real(-1.5));
        assert_eq!(Value::parse_literal("NULL"), Value::Null);
        assert_eq!(Value::parse_literal("Hawks"), Value::Text("Hawks".to_string()));
        assert_eq!(Value::parse_literal("inf"), Value::Text("inf".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_serialize_untagged() {
        let json = serde_json::to_string(&vec![Value::Integer(1), Value::from("Eagles"), Value::Null])
            .unwrap();
        assert_eq!(json, r#"[1,"Eagles",null]"#);
    }
}
