//! # heatlink Core Library
//!
//! Client side of the serial protocol spoken by Heliotherm heat pump controllers.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Typed parameter values with strict text codecs
//! - A static registry of device parameters with type, access and range metadata
//! - Session handling (connect, login, logout, close) over a serial link
//! - Parameter queries and updates validated against the registry
//! - Fault history and device identity queries
//!
//! ## Example
//!
//! ```rust,ignore
//! use heatlink_core::prelude::*;
//!
//! let config = ConnectionConfig::new("/dev/ttyUSB0", 115200);
//! let mut session = Session::open(Heatpump::new(config))?;
//!
//! println!("serial number: {}", session.get_serial_number()?);
//! let value = session.set_param_by_name("HKR Soll_Raum", &Value::Float(21.5))?;
//! for fault in session.get_fault_list()? {
//!     println!("{}", fault);
//! }
//! // logout and close run when `session` is dropped
//! ```

pub mod error;
pub mod params;
pub mod protocol;
pub mod status;

pub use error::{Error, ProtocolError, Result, ValidationError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, ProtocolError, Result, ValidationError};
    pub use crate::params::{Acl, CommandKind, DataType, ParamRegistry, Parameter, Value};
    pub use crate::protocol::{ConnectionConfig, DeviceCommands, Heatpump, Session, SessionState};
    pub use crate::status::{FaultEntry, SoftwareVersion};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
