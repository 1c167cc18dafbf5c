//! Serial Protocol Communication
//!
//! Implements the line-oriented ASCII protocol spoken by Heliotherm heat pump
//! controllers: one request line, one response line, strictly in turn.

pub mod commands;
mod connection;
pub mod link;
mod response;
pub mod serial;
mod session;

pub use commands::DeviceCommands;
pub use connection::{ConnectionConfig, Heatpump, SessionState, DEFAULT_PORT};
pub use link::{Link, LineReader};
pub use response::{decode_param_response, ResponseFields};
pub use serial::{check_baud_rate, open_port, SerialLink};
pub use session::Session;

/// Default baud rate of the controller
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Baud rates the controller can be configured for
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Default timeout for responses in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Longest response line accepted before giving up on framing
pub const MAX_LINE_LENGTH: usize = 1024;

/// Largest fault count accepted from a fault list header
pub const MAX_FAULT_RECORDS: usize = 1000;
