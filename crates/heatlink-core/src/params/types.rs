//! Parameter data types and their text codecs
//!
//! The device exchanges every value as a plain ASCII token. These helpers are
//! the only place where tokens become typed values and back.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ValidationError;

static INT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("Invalid INT token regex"));

static FLOAT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)$").expect("Invalid FLOAT token regex")
});

/// Value kinds a parameter can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// Free text, passed through unchanged
    String,
    /// Flag, `"0"`/`"1"` on the wire
    Bool,
    /// Signed integer
    Int,
    /// Decimal number, always rendered with a decimal point
    Float,
}

impl DataType {
    /// Name as used in parameter tables
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "STRING",
            DataType::Bool => "BOOL",
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ValidationError;

    /// Only the exact upper-case table names are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRING" => Ok(DataType::String),
            "BOOL" => Ok(DataType::Bool),
            "INT" => Ok(DataType::Int),
            "FLOAT" => Ok(DataType::Float),
            other => Err(ValidationError::UnknownDataType(other.to_string())),
        }
    }
}

impl DataType {
    /// Parse a table name where `None` marks a value without a data type
    pub fn parse_optional(s: &str) -> Result<Option<Self>, ValidationError> {
        match s {
            "None" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// BOOL value
    Bool(bool),
    /// INT value
    Int(i64),
    /// FLOAT value
    Float(f64),
    /// STRING value
    String(String),
}

impl Value {
    /// The data type this value belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

/// Values of different data types are unordered
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

fn invalid(data_type: DataType, token: &str) -> ValidationError {
    ValidationError::InvalidToken {
        data_type: data_type.to_string(),
        token: token.to_string(),
    }
}

/// Convert a wire/user token into a typed value
pub fn parse_value(text: &str, data_type: DataType) -> Result<Value, ValidationError> {
    match data_type {
        DataType::String => Ok(Value::String(text.to_string())),
        DataType::Bool => match text.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "n" => Ok(Value::Bool(false)),
            _ => Err(invalid(data_type, text)),
        },
        DataType::Int => {
            if !INT_TOKEN.is_match(text) {
                return Err(invalid(data_type, text));
            }
            // Digits only at this point, so the only failure left is overflow
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid(data_type, text))
        }
        DataType::Float => {
            if !FLOAT_TOKEN.is_match(text) {
                return Err(invalid(data_type, text));
            }
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| invalid(data_type, text))
        }
    }
}

/// Render a typed value as the token the device expects
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => {
            let s = v.to_string();
            if s.contains('.') || !v.is_finite() {
                s
            } else {
                format!("{}.0", s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_names() {
        assert_eq!("STRING".parse::<DataType>(), Ok(DataType::String));
        assert_eq!("BOOL".parse::<DataType>(), Ok(DataType::Bool));
        assert_eq!("INT".parse::<DataType>(), Ok(DataType::Int));
        assert_eq!("FLOAT".parse::<DataType>(), Ok(DataType::Float));
        for bad in ["string", "Bool", "integer", "float", "None", "123456", "WzßrÖt"] {
            assert!(bad.parse::<DataType>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_optional_data_type_names() {
        assert_eq!(DataType::parse_optional("None"), Ok(None));
        assert_eq!(DataType::parse_optional("FLOAT"), Ok(Some(DataType::Float)));
        for bad in ["none", "NONE", "", "float"] {
            assert_eq!(
                DataType::parse_optional(bad),
                Err(ValidationError::UnknownDataType(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_parse_bool_spellings() {
        for t in ["1", "true", "True", "TRUE", "yes", "YES", "y", "Y"] {
            assert_eq!(parse_value(t, DataType::Bool), Ok(Value::Bool(true)), "{t}");
        }
        for t in ["0", "false", "False", "FALSE", "no", "NO", "n", "N"] {
            assert_eq!(parse_value(t, DataType::Bool), Ok(Value::Bool(false)), "{t}");
        }
        assert!(parse_value("abc", DataType::Bool).is_err());
        assert!(parse_value("", DataType::Bool).is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_value("123", DataType::Int), Ok(Value::Int(123)));
        assert_eq!(parse_value("-321", DataType::Int), Ok(Value::Int(-321)));
        for bad in ["def", "--99", "12+55", "+5", "1.0", "", "-", "99999999999999999999"] {
            assert!(parse_value(bad, DataType::Int).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_value("123.456", DataType::Float), Ok(Value::Float(123.456)));
        assert_eq!(parse_value("-321.456", DataType::Float), Ok(Value::Float(-321.456)));
        assert_eq!(parse_value("789", DataType::Float), Ok(Value::Float(789.0)));
        for bad in ["ghi", "--99.0", "12.3+55.9", "+1.5", "1e5", "1.2.3", "", "-"] {
            assert!(parse_value(bad, DataType::Float).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_string_is_identity() {
        assert_eq!(
            parse_value("TestString", DataType::String),
            Ok(Value::String("TestString".to_string()))
        );
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_value(&Value::from("TestString")), "TestString");
        assert_eq!(format_value(&Value::Bool(false)), "0");
        assert_eq!(format_value(&Value::Bool(true)), "1");
        assert_eq!(format_value(&Value::Int(123)), "123");
        assert_eq!(format_value(&Value::Int(-321)), "-321");
        assert_eq!(format_value(&Value::Float(123.456)), "123.456");
        assert_eq!(format_value(&Value::Float(-321.456)), "-321.456");
        assert_eq!(format_value(&Value::Float(789.0)), "789.0");
        assert_eq!(format_value(&Value::Float(-789.0)), "-789.0");
    }

    #[test]
    fn test_numeric_round_trip() {
        for v in [0, 1, -1, 42, -32768, i64::MAX, i64::MIN] {
            let token = format_value(&Value::Int(v));
            assert_eq!(parse_value(&token, DataType::Int), Ok(Value::Int(v)));
        }
        for v in [0.0, 0.1, -0.5, 21.5, 1e15, -123456.789, f64::MAX, f64::MIN_POSITIVE] {
            let token = format_value(&Value::Float(v));
            assert!(token.contains('.'), "{token}");
            assert_eq!(parse_value(&token, DataType::Float), Ok(Value::Float(v)));
        }
    }

    #[test]
    fn test_mixed_types_are_unordered() {
        assert_eq!(Value::Int(1).partial_cmp(&Value::Float(1.0)), None);
        assert!(Value::Float(10.0) < Value::Float(30.0));
        assert!(Value::Bool(false) < Value::Bool(true));
    }
}
