//! Claim values.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Name/value map a token body serializes to.
pub type ClaimMap = serde_json::Map<String, Value>;

/// Value carried by a claim.
///
/// Datetime claims expect [`ClaimValue::Integer`] (or a numeric string);
/// custom claims may carry anything JSON can represent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    /// Whole number, typically a unix timestamp.
    Integer(i64),
    /// Text value.
    String(String),
    /// Any other JSON value (objects, arrays, floats, booleans, null).
    Structured(Value),
}

impl ClaimValue {
    /// Interprets the value as unix seconds.
    ///
    /// Integers, integral JSON numbers and strings holding an integer are
    /// accepted. Anything else yields `None`.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            Self::Structured(Value::Number(n)) => n.as_i64(),
            Self::Structured(_) => None,
        }
    }

    /// Returns the text if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value into its JSON representation.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(n) => Value::from(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::Structured(v) => v.clone(),
        }
    }
}

impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Structured(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for ClaimValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for ClaimValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for ClaimValue {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<&str> for ClaimValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<OffsetDateTime> for ClaimValue {
    fn from(dt: OffsetDateTime) -> Self {
        Self::Integer(dt.unix_timestamp())
    }
}

impl From<Value> for ClaimValue {
    /// Integral numbers and strings are normalized to their dedicated
    /// variants so decoded claims compare equal to freshly built ones.
    fn from(value: Value) -> Self {
        match value {
            Value::Number(ref n) if n.is_i64() => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Structured(value),
            },
            Value::String(s) => Self::String(s),
            other => Self::Structured(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_timestamp() {
        assert_eq!(ClaimValue::from(1_700_000_000).as_timestamp(), Some(1_700_000_000));
        assert_eq!(ClaimValue::from("1700000000").as_timestamp(), Some(1_700_000_000));
        assert_eq!(ClaimValue::from("tomorrow").as_timestamp(), None);
        assert_eq!(ClaimValue::from(json!(1.5)).as_timestamp(), None);
        assert_eq!(ClaimValue::from(json!({"a": 1})).as_timestamp(), None);
    }

    #[test]
    fn test_from_json_normalizes() {
        assert_eq!(ClaimValue::from(json!(42)), ClaimValue::Integer(42));
        assert_eq!(ClaimValue::from(json!("bar")), ClaimValue::String("bar".into()));
        assert_eq!(
            ClaimValue::from(json!(["a", "b"])),
            ClaimValue::Structured(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_from_datetime() {
        let dt = OffsetDateTime::from_unix_timestamp(1_234_567_890).unwrap();
        assert_eq!(ClaimValue::from(dt), ClaimValue::Integer(1_234_567_890));
    }

    #[test]
    fn test_untagged_serde() {
        let value: ClaimValue = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(value, ClaimValue::Integer(7));

        let value: ClaimValue = serde_json::from_value(json!("x")).unwrap();
        assert_eq!(value, ClaimValue::String("x".into()));

        let value: ClaimValue = serde_json::from_value(json!({"k": true})).unwrap();
        assert_eq!(value.to_json(), json!({"k": true}));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"k": true}));
    }

    #[test]
    fn test_display() {
        assert_eq!(ClaimValue::from(5).to_string(), "5");
        assert_eq!(ClaimValue::from("abc").to_string(), "abc");
    }
}
