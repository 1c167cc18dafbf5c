//! Parameter registry
//!
//! Parameters live in a flat vector with a name index on the side. The registry
//! is built once from a text table and never mutated afterwards, so it can be
//! shared between threads behind an `Arc` without locking.
//!
//! Table format, one parameter per line:
//!
//! ```text
//! # name,index,type,acl,min,max
//! HKR Soll_Raum,21,FLOAT,rw,10.0,30.0
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use super::param::{Acl, Parameter};
use super::types::{parse_value, DataType};
use crate::error::{Error, Result, ValidationError};

/// Table shipped with the crate
const BUILTIN_TABLE: &str = include_str!("htparams.csv");

static BUILTIN: LazyLock<ParamRegistry> = LazyLock::new(|| {
    ParamRegistry::from_table_str(BUILTIN_TABLE).expect("built-in parameter table is valid")
});

/// Directory below the home directory searched for a user table
const USER_DIR: &str = ".heatlink";

/// File name of the user table
const USER_TABLE: &str = "htparams.csv";

/// Immutable name → parameter mapping
#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    params: Vec<Parameter>,
    by_name: HashMap<String, usize>,
}

impl ParamRegistry {
    /// Build a registry from already constructed parameters
    pub fn from_params(params: Vec<Parameter>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            if by_name.insert(param.name().to_string(), i).is_some() {
                return Err(ValidationError::MalformedRow {
                    line: i + 1,
                    message: format!("duplicate parameter '{}'", param.name()),
                }
                .into());
            }
        }
        Ok(Self { params, by_name })
    }

    /// Parse a parameter table
    pub fn from_table_str(text: &str) -> Result<Self> {
        let mut params = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let param = parse_row(line, line_no)?;
            if let Some(first) = seen.insert(param.name().to_string(), line_no) {
                return Err(ValidationError::MalformedRow {
                    line: line_no,
                    message: format!(
                        "duplicate parameter '{}' (first defined on line {})",
                        param.name(),
                        first
                    ),
                }
                .into());
            }
            params.push(param);
        }

        Self::from_params(params)
    }

    /// Load a parameter table from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let registry = Self::from_table_str(&text)?;
        info!(
            "Loaded {} parameters from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// The table compiled into the crate
    pub fn builtin() -> &'static ParamRegistry {
        &BUILTIN
    }

    /// Location of the optional user table (`~/.heatlink/htparams.csv`)
    pub fn user_table_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(USER_DIR).join(USER_TABLE))
    }

    /// The user table if one exists, otherwise the built-in one
    pub fn load() -> Result<Self> {
        match Self::user_table_path() {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => {
                debug!("No user parameter table, using built-in table");
                Ok(Self::builtin().clone())
            }
        }
    }

    /// Look up a parameter by its exact name
    pub fn get(&self, name: &str) -> Result<&Parameter> {
        self.by_name
            .get(name)
            .map(|&i| &self.params[i])
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in table order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name())
    }
}

fn parse_row(line: &str, line_no: usize) -> Result<Parameter> {
    let malformed = |message: String| ValidationError::MalformedRow {
        line: line_no,
        message,
    };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, index, data_type, acl, min, max] = fields.as_slice() else {
        return Err(malformed(format!("expected 6 fields, found {}", fields.len())).into());
    };
    if name.is_empty() {
        return Err(malformed("empty parameter name".to_string()).into());
    }

    let index: u32 = index
        .parse()
        .map_err(|_| malformed(format!("invalid protocol index '{}'", index)))?;
    let data_type: DataType = data_type.parse()?;
    let acl: Acl = acl.parse()?;
    let min = parse_value(min, data_type)?;
    let max = parse_value(max, data_type)?;

    Ok(Parameter::new(*name, index, data_type, acl, min, max)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CommandKind, Value};
    use regex::Regex;
    use std::cmp::Ordering;

    #[test]
    fn test_builtin_table_loads() {
        let registry = ParamRegistry::builtin();
        assert!(!registry.is_empty());
        let p = registry.get("HKR Soll_Raum").unwrap();
        assert_eq!(p.index(), 21);
        assert_eq!(p.data_type(), DataType::Float);
        assert_eq!(p.acl(), Acl::ReadWrite);
        assert_eq!(p.min(), &Value::Float(10.0));
        assert_eq!(p.max(), &Value::Float(30.0));
    }

    #[test]
    fn test_builtin_limits_are_ordered() {
        for p in ParamRegistry::builtin().iter() {
            assert!(
                matches!(
                    p.min().partial_cmp(p.max()),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                "limits of parameter {:?} are not ordered",
                p.name()
            );
        }
    }

    #[test]
    fn test_builtin_acl_codes() {
        let re = Regex::new(r"^(r-|-w|rw)$").unwrap();
        for p in ParamRegistry::builtin().iter() {
            assert!(re.is_match(p.acl().as_str()), "acl of {:?}", p.name());
        }
    }

    #[test]
    fn test_builtin_command_format() {
        let re = Regex::new(r"^[MS]P,NR=\d+$").unwrap();
        for p in ParamRegistry::builtin().iter() {
            for kind in [CommandKind::Query, CommandKind::Set] {
                let cmd = p.command_string(kind);
                assert!(re.is_match(&cmd), "command {:?} for {:?}", cmd, p.name());
            }
        }
    }

    #[test]
    fn test_unknown_parameter() {
        let err = ParamRegistry::builtin().get("Does not exist").unwrap_err();
        assert!(matches!(err, Error::UnknownParameter(ref n) if n == "Does not exist"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let registry = ParamRegistry::from_table_str(
            "# comment\n\nBetriebsart,0,INT,rw,0,7\n   \n# another\nVerdichter,19,BOOL,r-,0,1\n",
        )
        .unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["Betriebsart", "Verdichter"]);
    }

    #[test]
    fn test_rejects_invalid_acl() {
        let err = ParamRegistry::from_table_str("Betriebsart,0,INT,wr,0,7").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidAcl(ref code)) if code == "wr"
        ));
    }

    #[test]
    fn test_rejects_inverted_limits() {
        let err = ParamRegistry::from_table_str("Betriebsart,0,INT,rw,7,0").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = ParamRegistry::from_table_str(
            "Betriebsart,0,INT,rw,0,7\nBetriebsart,1,INT,rw,0,7",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_short_rows_and_bad_types() {
        assert!(ParamRegistry::from_table_str("Betriebsart,0,INT,rw,0").is_err());
        assert!(ParamRegistry::from_table_str("Betriebsart,x,INT,rw,0,7").is_err());
        assert!(ParamRegistry::from_table_str("Betriebsart,0,int,rw,0,7").is_err());
        assert!(ParamRegistry::from_table_str("Betriebsart,0,INT,rw,--1,7").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("htparams.csv");
        std::fs::write(&path, "HKR Soll_Raum,21,FLOAT,rw,10.0,30.0\n").unwrap();
        let registry = ParamRegistry::from_file(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("HKR Soll_Raum"));

        let missing = ParamRegistry::from_file(dir.path().join("missing.csv"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
