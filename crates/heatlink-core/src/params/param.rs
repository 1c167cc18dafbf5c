//! Parameter definitions
//!
//! A [`Parameter`] ties a human-readable name to the protocol index the device
//! knows it by, together with its data type, access mode and legal range.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::types::{format_value, parse_value, DataType, Value};
use crate::error::ValidationError;

/// Access control mode of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Acl {
    /// `r-`
    ReadOnly,
    /// `-w`
    WriteOnly,
    /// `rw`
    ReadWrite,
}

impl Acl {
    /// Two-character code as used in parameter tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::ReadOnly => "r-",
            Acl::WriteOnly => "-w",
            Acl::ReadWrite => "rw",
        }
    }

    pub fn can_read(&self) -> bool {
        matches!(self, Acl::ReadOnly | Acl::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Acl::WriteOnly | Acl::ReadWrite)
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Acl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r-" => Ok(Acl::ReadOnly),
            "-w" => Ok(Acl::WriteOnly),
            "rw" => Ok(Acl::ReadWrite),
            other => Err(ValidationError::InvalidAcl(other.to_string())),
        }
    }
}

/// Which of the two parameter commands to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Monitor command, `MP,...`
    Query,
    /// Set command, `SP,...`
    Set,
}

impl CommandKind {
    fn prefix(&self) -> char {
        match self {
            CommandKind::Query => 'M',
            CommandKind::Set => 'S',
        }
    }
}

/// Immutable registry entry describing one device parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    index: u32,
    data_type: DataType,
    acl: Acl,
    min: Value,
    max: Value,
}

impl Parameter {
    /// Create a parameter, checking that both bounds carry `data_type` and `min <= max`
    pub fn new(
        name: impl Into<String>,
        index: u32,
        data_type: DataType,
        acl: Acl,
        min: Value,
        max: Value,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        for bound in [&min, &max] {
            if bound.data_type() != data_type {
                return Err(ValidationError::TypeMismatch {
                    name,
                    expected: data_type.to_string(),
                    actual: bound.data_type().to_string(),
                });
            }
        }
        if !matches!(
            min.partial_cmp(&max),
            Some(Ordering::Less | Ordering::Equal)
        ) {
            return Err(ValidationError::InvalidBounds {
                name,
                min: format_value(&min),
                max: format_value(&max),
            });
        }

        Ok(Self {
            name,
            index,
            data_type,
            acl,
            min,
            max,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocol index (`NR=`)
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn acl(&self) -> Acl {
        self.acl
    }

    pub fn min(&self) -> &Value {
        &self.min
    }

    pub fn max(&self) -> &Value {
        &self.max
    }

    /// Wire command addressing this parameter, e.g. `MP,NR=21`
    pub fn command_string(&self, kind: CommandKind) -> String {
        format!("{}P,NR={}", kind.prefix(), self.index)
    }

    /// Parse a token with this parameter's data type
    pub fn parse_value(&self, text: &str) -> Result<Value, ValidationError> {
        parse_value(text, self.data_type)
    }

    /// Format a value with this parameter's data type
    pub fn format_value(&self, value: &Value) -> String {
        format_value(value)
    }

    /// Check that `value` has the right type and lies within `[min, max]`.
    ///
    /// STRING parameters carry placeholder bounds and are only type-checked.
    pub fn check_value(&self, value: &Value) -> Result<(), ValidationError> {
        if value.data_type() != self.data_type {
            return Err(ValidationError::TypeMismatch {
                name: self.name.clone(),
                expected: self.data_type.to_string(),
                actual: value.data_type().to_string(),
            });
        }
        if self.data_type == DataType::String {
            return Ok(());
        }
        let in_range = matches!(
            value.partial_cmp(&self.min),
            Some(Ordering::Greater | Ordering::Equal)
        ) && matches!(
            value.partial_cmp(&self.max),
            Some(Ordering::Less | Ordering::Equal)
        );
        if in_range {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                name: self.name.clone(),
                value: format_value(value),
                min: format_value(&self.min),
                max: format_value(&self.max),
            })
        }
    }

    pub(crate) fn require_access(&self, write: bool) -> Result<(), ValidationError> {
        let allowed = if write {
            self.acl.can_write()
        } else {
            self.acl.can_read()
        };
        if allowed {
            Ok(())
        } else {
            Err(ValidationError::AccessDenied {
                name: self.name.clone(),
                acl: self.acl.to_string(),
                operation: if write { "write" } else { "read" },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soll_raum() -> Parameter {
        Parameter::new(
            "HKR Soll_Raum",
            21,
            DataType::Float,
            Acl::ReadWrite,
            Value::Float(10.0),
            Value::Float(30.0),
        )
        .unwrap()
    }

    #[test]
    fn test_acl_codes() {
        assert_eq!("r-".parse::<Acl>(), Ok(Acl::ReadOnly));
        assert_eq!("-w".parse::<Acl>(), Ok(Acl::WriteOnly));
        assert_eq!("rw".parse::<Acl>(), Ok(Acl::ReadWrite));
        for bad in ["", "r", "w", "wr", "RW", "r-w", "--"] {
            assert_eq!(
                bad.parse::<Acl>(),
                Err(ValidationError::InvalidAcl(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_command_strings() {
        let p = soll_raum();
        assert_eq!(p.command_string(CommandKind::Query), "MP,NR=21");
        assert_eq!(p.command_string(CommandKind::Set), "SP,NR=21");
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = Parameter::new(
            "Broken",
            1,
            DataType::Int,
            Acl::ReadOnly,
            Value::Int(5),
            Value::Int(1),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBounds { .. }));
    }

    #[test]
    fn test_rejects_mistyped_bounds() {
        let err = Parameter::new(
            "Broken",
            1,
            DataType::Int,
            Acl::ReadOnly,
            Value::Float(0.0),
            Value::Int(1),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));
    }

    #[test]
    fn test_check_value_range() {
        let p = soll_raum();
        assert!(p.check_value(&Value::Float(10.0)).is_ok());
        assert!(p.check_value(&Value::Float(21.5)).is_ok());
        assert!(p.check_value(&Value::Float(30.0)).is_ok());
        assert!(matches!(
            p.check_value(&Value::Float(30.5)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            p.check_value(&Value::Float(f64::NAN)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            p.check_value(&Value::Int(20)),
            Err(ValidationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_access_checks() {
        let ro = Parameter::new(
            "Temp. Aussen",
            2,
            DataType::Float,
            Acl::ReadOnly,
            Value::Float(-20.0),
            Value::Float(40.0),
        )
        .unwrap();
        assert!(ro.require_access(false).is_ok());
        assert!(matches!(
            ro.require_access(true),
            Err(ValidationError::AccessDenied { operation: "write", .. })
        ));
    }
}
