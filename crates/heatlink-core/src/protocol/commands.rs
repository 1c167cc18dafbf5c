//! Device command strings
//!
//! Parameter commands follow a fixed `MP,NR=<n>` / `SP,NR=<n>` shape and are
//! built by [`Parameter::command_string`](crate::params::Parameter::command_string).
//! Everything else (handshake and status queries) is firmware specific and
//! therefore configurable.

use serde::{Deserialize, Serialize};

/// Handshake and status commands understood by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCommands {
    /// Sent to open a session
    pub login: String,
    /// Sent to end a session
    pub logout: String,
    /// Response line acknowledging login/logout
    pub acknowledge: String,
    /// Field carrying the new value in a set command, `SP,NR=<n>,<field>=<value>`
    pub set_value_field: String,
    /// Serial number query
    pub serial_number: String,
    /// Field holding the serial number in the response
    pub serial_number_field: String,
    /// Software version query
    pub version: String,
    /// Field holding the version display string
    pub version_name_field: String,
    /// Field holding the numeric build identifier
    pub version_build_field: String,
    /// Fault history query; answered by a header line, then one line per record
    pub fault_list: String,
    /// Header field announcing the number of records that follow
    pub fault_count_field: String,
    /// Last-fault query; answered by a single record line
    pub last_fault: String,
}

impl Default for DeviceCommands {
    fn default() -> Self {
        Self {
            login: "LIN".to_string(),
            logout: "LOUT".to_string(),
            acknowledge: "OK".to_string(),
            set_value_field: "VAL".to_string(),
            serial_number: "RID".to_string(),
            serial_number_field: "SN".to_string(),
            version: "SP,NR=9".to_string(),
            version_name_field: "NAME".to_string(),
            version_build_field: "VAL".to_string(),
            fault_list: "AR".to_string(),
            fault_count_field: "NUM".to_string(),
            last_fault: "ERR".to_string(),
        }
    }
}

impl DeviceCommands {
    /// Append a formatted value to a set command
    pub fn set_command(&self, base: &str, token: &str) -> String {
        format!("{},{}={}", base, self.set_value_field, token)
    }

    /// Whether `response` acknowledges a login/logout
    pub fn is_acknowledge(&self, response: &str) -> bool {
        response.trim() == self.acknowledge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_command() {
        let cmds = DeviceCommands::default();
        assert_eq!(cmds.set_command("SP,NR=21", "21.5"), "SP,NR=21,VAL=21.5");
    }

    #[test]
    fn test_acknowledge() {
        let cmds = DeviceCommands::default();
        assert!(cmds.is_acknowledge("OK"));
        assert!(cmds.is_acknowledge(" OK "));
        assert!(!cmds.is_acknowledge("ERR"));
    }

    #[test]
    fn test_partial_override_from_json() {
        let cmds: DeviceCommands =
            serde_json::from_str(r#"{"login": "LOGIN", "acknowledge": "ACK"}"#).unwrap();
        assert_eq!(cmds.login, "LOGIN");
        assert_eq!(cmds.acknowledge, "ACK");
        assert_eq!(cmds.logout, "LOUT");
    }
}
