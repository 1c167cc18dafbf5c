//! Device status queries
//!
//! Fault history and device identity, decoded on top of the request/response
//! exchange in [`Heatpump`].

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::{ProtocolError, Result};
use crate::protocol::{Heatpump, ResponseFields, MAX_FAULT_RECORDS};

/// `#011 [2014-08-06T13:28:27]: 65534, Keine Stoerung`
static FAULT_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(\d{3}) \[(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})\]: (\d{5}), (.*)$")
        .expect("Invalid fault record regex")
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One entry of the device's fault memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultEntry {
    /// Position in fault memory, only meaningful within one query
    pub index: usize,
    /// Device error code
    pub error_code: u16,
    /// Controller local time, no zone information
    pub timestamp: NaiveDateTime,
    pub message: String,
}

impl fmt::Display for FaultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:03} [{}]: {:05}, {}",
            self.index,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.error_code,
            self.message
        )
    }
}

/// Decode a single fault record line
pub fn parse_fault_record(line: &str) -> std::result::Result<FaultEntry, ProtocolError> {
    let malformed = || ProtocolError::MalformedFaultRecord(line.to_string());
    let caps = FAULT_RECORD.captures(line).ok_or_else(malformed)?;

    let index: usize = caps[1].parse().map_err(|_| malformed())?;
    let timestamp =
        NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT).map_err(|_| malformed())?;
    let error_code: u16 = caps[3].parse().map_err(|_| malformed())?;

    Ok(FaultEntry {
        index,
        error_code,
        timestamp,
        message: caps[4].to_string(),
    })
}

/// Software version reported by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareVersion {
    /// Human-readable version, e.g. `3.0.20`
    pub display: String,
    /// Numeric build identifier
    pub build: u32,
}

impl fmt::Display for SoftwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display, self.build)
    }
}

impl Heatpump {
    /// Query the complete fault history in device order.
    ///
    /// All announced records are read before any of them is decoded, so a bad
    /// record fails the query without leaving unread lines on the link.
    pub fn get_fault_list(&mut self) -> Result<Vec<FaultEntry>> {
        self.require_logged_in("get fault list")?;
        let command = self.config().commands.fault_list.clone();
        let count_field = self.config().commands.fault_count_field.clone();

        let header = self.exchange(&command)?;
        let fields = ResponseFields::parse(&header, &command)?;
        let count: usize = fields.require_number(&count_field)?;
        if count > MAX_FAULT_RECORDS {
            return Err(ProtocolError::InvalidValue {
                token: count.to_string(),
                field: count_field,
            }
            .into());
        }
        debug!("Fault list has {} entries", count);

        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            lines.push(self.read_response()?);
        }

        let entries = lines
            .iter()
            .map(|line| parse_fault_record(line))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Query only the most recent fault entry
    pub fn get_last_fault(&mut self) -> Result<FaultEntry> {
        self.require_logged_in("get last fault")?;
        let command = self.config().commands.last_fault.clone();
        let line = self.exchange(&command)?;
        Ok(parse_fault_record(&line)?)
    }

    /// Query the controller's serial number
    pub fn get_serial_number(&mut self) -> Result<u64> {
        self.require_logged_in("get serial number")?;
        let commands = &self.config().commands;
        let (command, field) = (commands.serial_number.clone(), commands.serial_number_field.clone());

        let response = self.exchange(&command)?;
        let serial: u64 = ResponseFields::parse(&response, &command)?.require_number(&field)?;
        info!("Serial number {}", serial);
        Ok(serial)
    }

    /// Query the controller's software version
    pub fn get_version(&mut self) -> Result<SoftwareVersion> {
        self.require_logged_in("get version")?;
        let commands = &self.config().commands;
        let command = commands.version.clone();
        let name_field = commands.version_name_field.clone();
        let build_field = commands.version_build_field.clone();

        let response = self.exchange(&command)?;
        let fields = ResponseFields::parse(&response, &command)?;
        let version = SoftwareVersion {
            display: fields.require(&name_field)?.to_string(),
            build: fields.require_number(&build_field)?,
        };
        info!("Software version {}", version);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_fault_record() {
        let entry = parse_fault_record("#011 [2014-08-06T13:28:27]: 65534, Keine Stoerung").unwrap();
        assert_eq!(
            entry,
            FaultEntry {
                index: 11,
                error_code: 65534,
                timestamp: NaiveDate::from_ymd_opt(2014, 8, 6)
                    .unwrap()
                    .and_hms_opt(13, 28, 27)
                    .unwrap(),
                message: "Keine Stoerung".to_string(),
            }
        );
    }

    #[test]
    fn test_message_keeps_colons_and_commas() {
        let entry =
            parse_fault_record("#001 [2000-01-01T00:00:00]: 65286, Info: Programmupdate 1, ok")
                .unwrap();
        assert_eq!(entry.error_code, 65286);
        assert_eq!(entry.message, "Info: Programmupdate 1, ok");
    }

    #[test]
    fn test_non_ascii_message() {
        let entry = parse_fault_record("#003 [2000-01-01T00:00:16]: 00009, HD Schalter Störung").unwrap();
        assert_eq!(entry.error_code, 9);
        assert_eq!(entry.message, "HD Schalter Störung");
    }

    #[test]
    fn test_malformed_records() {
        for line in [
            "",
            "#11 [2014-08-06T13:28:27]: 65534, Keine Stoerung",
            "#011 2014-08-06T13:28:27: 65534, Keine Stoerung",
            "#011 [2014-08-06 13:28:27]: 65534, Keine Stoerung",
            "#011 [2014-13-06T13:28:27]: 65534, Keine Stoerung",
            "#011 [2014-08-06T13:28:27]: 655, Keine Stoerung",
            "#011 [2014-08-06T13:28:27]: 65536, Overflow",
            "#011 [2014-08-06T13:28:27] 65534, Keine Stoerung",
        ] {
            assert_eq!(
                parse_fault_record(line),
                Err(ProtocolError::MalformedFaultRecord(line.to_string())),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_display_matches_record_format() {
        let line = "#005 [2014-08-06T13:25:54]: 65289, Info: Manueller Init";
        assert_eq!(parse_fault_record(line).unwrap().to_string(), line);
    }

    #[test]
    fn test_version_display() {
        let v = SoftwareVersion {
            display: "3.0.20".to_string(),
            build: 2321,
        };
        assert_eq!(v.to_string(), "3.0.20 (2321)");
    }
}
