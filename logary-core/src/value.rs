use std::collections::BTreeMap;
use std::fmt;

/// A structured value carried by a [`crate::Message`] or its context map.
///
/// Tagged union over the handful of shapes a log event payload can take.
/// Nesting via `Object`/`Array` is permitted; this type has no way to
/// express cycles, so none can occur.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A UTF-8 string.
    String(String),
    /// A signed 64-bit integer.
    Int64(i64),
    /// A 64-bit float.
    Float64(f64),
    /// A boolean.
    Bool(bool),
    /// A nested object, keyed by field name.
    Object(BTreeMap<String, Value>),
    /// An ordered sequence of values.
    Array(Vec<Value>),
}

impl Value {
    /// Shorthand for `Value::String(s.into())`.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Returns the inner string if this is a `Value::String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_conversion() {
        let v: Value = "hi".into();
        assert_eq!(v.as_str(), Some("hi"));
    }

    #[test]
    fn display_nesting() {
        let mut inner = BTreeMap::new();
        inner.insert("a".to_string(), Value::Int64(1));
        let v = Value::Object(inner);
        assert_eq!(v.to_string(), "{a=1}");
    }
}
