//! Response line parsing
//!
//! Every response echoes the command it answers, followed by comma separated
//! `KEY=VALUE` fields in no particular order:
//!
//! ```text
//! MP,NR=21,ID=21,NAME=HKR Soll_Raum,LEN=4,TP=0,BIT=0,VAL=21.5,MAX=30.0,MIN=10.0
//! ```

use std::collections::HashMap;

use crate::error::ProtocolError;
use crate::params::{parse_value, DataType, Parameter, Value};

/// Fields of a single response line
#[derive(Debug, Clone)]
pub struct ResponseFields {
    raw: String,
    fields: HashMap<String, String>,
}

impl ResponseFields {
    /// Check the echoed command and split the remainder into fields.
    ///
    /// Pieces without `=` are ignored, and the first occurrence of a key wins.
    pub fn parse(response: &str, command: &str) -> Result<Self, ProtocolError> {
        if response.trim().is_empty() {
            return Err(ProtocolError::MalformedResponse {
                response: response.to_string(),
            });
        }

        let mismatch = || ProtocolError::CommandMismatch {
            expected: command.to_string(),
            response: response.to_string(),
        };
        let rest = response.strip_prefix(command).ok_or_else(mismatch)?;
        let rest = if rest.is_empty() {
            rest
        } else {
            rest.strip_prefix(',').ok_or_else(mismatch)?
        };

        let mut fields = HashMap::new();
        for piece in rest.split(',') {
            if let Some((key, value)) = piece.split_once('=') {
                fields
                    .entry(key.trim().to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
        }

        Ok(Self {
            raw: response.to_string(),
            fields,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, ProtocolError> {
        self.get(key).ok_or_else(|| ProtocolError::MissingField {
            field: key.to_string(),
            response: self.raw.clone(),
        })
    }

    /// Required field parsed with the parameter's data type
    pub fn require_value(&self, key: &str, param: &Parameter) -> Result<Value, ProtocolError> {
        let token = self.require(key)?;
        parse_value(token, param.data_type()).map_err(|_| ProtocolError::InvalidValue {
            field: key.to_string(),
            token: token.to_string(),
        })
    }

    /// Required field parsed as a number
    pub fn require_number<T: std::str::FromStr>(&self, key: &str) -> Result<T, ProtocolError> {
        let token = self.require(key)?;
        token.parse().map_err(|_| ProtocolError::InvalidValue {
            field: key.to_string(),
            token: token.to_string(),
        })
    }

    /// The raw response line
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Decode a query or set acknowledgement for `param`.
///
/// The reported name and, for non-string parameters, the reported limits must
/// agree with the registry; otherwise the device and the table have drifted.
pub fn decode_param_response(
    param: &Parameter,
    command: &str,
    response: &str,
) -> Result<Value, ProtocolError> {
    let fields = ResponseFields::parse(response, command)?;

    let name = fields.require("NAME")?;
    if name != param.name() {
        return Err(ProtocolError::NameMismatch {
            expected: param.name().to_string(),
            actual: name.to_string(),
        });
    }

    let value = fields.require_value("VAL", param)?;
    let max = fields.require_value("MAX", param)?;
    let min = fields.require_value("MIN", param)?;

    if param.data_type() != DataType::String {
        for (bound, reported, declared) in [("MAX", &max, param.max()), ("MIN", &min, param.min())] {
            if reported != declared {
                return Err(ProtocolError::BoundMismatch {
                    name: param.name().to_string(),
                    bound,
                    expected: declared.to_string(),
                    actual: reported.to_string(),
                });
            }
        }
    }

    Ok(value)
}
