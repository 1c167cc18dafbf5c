//! Connection management
//!
//! Handles the session lifecycle and the request/response exchange with the
//! heat pump controller.
//!
//! ```text
//! Disconnected -> Connected -> LoggedIn -> LoggedOut -> Disconnected
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    commands::DeviceCommands,
    link::{write_line, Link, LineReader},
    response::decode_param_response,
    serial::open_port,
    DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
use crate::error::{Error, ProtocolError, Result, ValidationError};
use crate::params::{format_value, CommandKind, ParamRegistry, Parameter, Value};

/// Default serial device
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No link open
    Disconnected,
    /// Link open, not logged in
    Connected,
    /// Logged in and ready for commands
    LoggedIn,
    /// Logged out, link still open
    LoggedOut,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial device path
    pub port_name: String,
    /// Baud rate, must match the controller's setting
    pub baud_rate: u32,
    /// Response timeout in milliseconds
    pub timeout_ms: u64,
    /// Firmware specific command strings
    pub commands: DeviceCommands,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            commands: DeviceCommands::default(),
        }
    }
}

impl ConnectionConfig {
    /// Config for a port with default settings otherwise
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Self::default()
        }
    }

    /// Load from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidConfig(e.to_string()).into())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Client for one heat pump controller.
///
/// Strictly one request in flight: every request is followed by reading its
/// response before anything else is written. Share between threads only behind
/// a lock held for a whole exchange.
pub struct Heatpump {
    config: ConnectionConfig,
    registry: Arc<ParamRegistry>,
    link: Option<Box<dyn Link>>,
    reader: LineReader,
    state: SessionState,
}

impl Heatpump {
    /// Create a client using the built-in parameter table
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_registry(config, Arc::new(ParamRegistry::builtin().clone()))
    }

    /// Create a client using a specific parameter registry
    pub fn with_registry(config: ConnectionConfig, registry: Arc<ParamRegistry>) -> Self {
        Self {
            config,
            registry,
            link: None,
            reader: LineReader::new(),
            state: SessionState::Disconnected,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ParamRegistry> {
        &self.registry
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::LoggedIn
    }

    /// Open the configured serial port
    pub fn open_connection(&mut self) -> Result<()> {
        self.require_state("open connection", &[SessionState::Disconnected])?;
        let link = open_port(&self.config.port_name, self.config.baud_rate)?;
        info!(
            "Connected to {} at {} baud",
            self.config.port_name, self.config.baud_rate
        );
        self.attach(Box::new(link))
    }

    /// Use an already open link instead of the configured serial port
    pub fn attach(&mut self, link: Box<dyn Link>) -> Result<()> {
        self.require_state("attach link", &[SessionState::Disconnected])?;
        self.link = Some(link);
        self.reader = LineReader::new();
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Perform the login handshake
    pub fn login(&mut self) -> Result<()> {
        self.require_state("login", &[SessionState::Connected])?;
        let command = self.config.commands.login.clone();
        self.handshake(&command)?;
        self.state = SessionState::LoggedIn;
        info!("Logged in");
        Ok(())
    }

    /// End the session. Never fails: problems are logged and the session is
    /// considered logged out regardless.
    pub fn logout(&mut self) {
        if self.state != SessionState::LoggedIn {
            debug!("logout: not logged in ({:?}), nothing to do", self.state);
            return;
        }
        let command = self.config.commands.logout.clone();
        match self.handshake(&command) {
            Ok(()) => info!("Logged out"),
            Err(e) => warn!("Logout failed: {}", e),
        }
        self.state = SessionState::LoggedOut;
    }

    /// Release the link. Safe to call in any state, any number of times.
    pub fn close_connection(&mut self) {
        if self.link.take().is_some() {
            info!("Connection closed");
        }
        self.reader = LineReader::new();
        self.state = SessionState::Disconnected;
    }

    /// Write one request line, discarding any stale input first
    pub fn send_request(&mut self, command: &str) -> Result<()> {
        let link = self.link.as_deref_mut().ok_or(Error::InvalidState {
            operation: "send request",
            state: self.state,
        })?;
        self.reader.discard(link);
        debug!("-> {}", command);
        write_line(link, command)
    }

    /// Read one response line within the configured timeout
    pub fn read_response(&mut self) -> Result<String> {
        let timeout = self.config.timeout();
        let link = self.link.as_deref_mut().ok_or(Error::InvalidState {
            operation: "read response",
            state: self.state,
        })?;
        match self.reader.read_line(link, timeout) {
            Ok(line) => {
                debug!("<- {}", line);
                Ok(line)
            }
            Err(e) => {
                warn!("No valid response: {}", e);
                Err(e)
            }
        }
    }

    /// Send a request and read its response line
    pub(crate) fn exchange(&mut self, command: &str) -> Result<String> {
        self.send_request(command)?;
        self.read_response()
    }

    fn handshake(&mut self, command: &str) -> Result<()> {
        let response = self.exchange(command)?;
        if self.config.commands.is_acknowledge(&response) {
            Ok(())
        } else {
            Err(ProtocolError::NotAcknowledged {
                command: command.to_string(),
                response,
            }
            .into())
        }
    }

    fn require_state(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    pub(crate) fn require_logged_in(&self, operation: &'static str) -> Result<()> {
        self.require_state(operation, &[SessionState::LoggedIn])
    }

    /// Query the current value of a parameter
    pub fn get_param(&mut self, param: &Parameter) -> Result<Value> {
        param.require_access(false)?;
        self.require_logged_in("get parameter")?;

        let command = param.command_string(CommandKind::Query);
        let response = self.exchange(&command)?;
        let value = decode_param_response(param, &command, &response)?;
        debug!("{} = {}", param.name(), value);
        Ok(value)
    }

    /// Set a parameter and return the value the device reports back.
    ///
    /// Type, range and access are checked before anything is sent.
    pub fn set_param(&mut self, param: &Parameter, value: &Value) -> Result<Value> {
        param.require_access(true)?;
        param.check_value(value)?;
        self.require_logged_in("set parameter")?;

        let base = param.command_string(CommandKind::Set);
        let command = self.config.commands.set_command(&base, &format_value(value));
        let response = self.exchange(&command)?;
        let stored = decode_param_response(param, &base, &response)?;
        info!("{} set to {} (device reports {})", param.name(), value, stored);
        Ok(stored)
    }

    /// [`get_param`](Self::get_param) by registry name
    pub fn get_param_by_name(&mut self, name: &str) -> Result<Value> {
        let registry = Arc::clone(&self.registry);
        let param = registry.get(name)?;
        self.get_param(param)
    }

    /// [`set_param`](Self::set_param) by registry name
    pub fn set_param_by_name(&mut self, name: &str, value: &Value) -> Result<Value> {
        let registry = Arc::clone(&self.registry);
        let param = registry.get(name)?;
        self.set_param(param, value)
    }

    /// Query several parameters in order; the first failure aborts
    pub fn query_params(&mut self, names: &[&str]) -> Result<Vec<(String, Value)>> {
        let registry = Arc::clone(&self.registry);
        let params = names
            .iter()
            .map(|name| registry.get(name))
            .collect::<Result<Vec<_>>>()?;

        let mut values = Vec::with_capacity(params.len());
        for param in params {
            let value = self.get_param(param)?;
            values.push((param.name().to_string(), value));
        }
        Ok(values)
    }
}

impl Drop for Heatpump {
    fn drop(&mut self) {
        self.close_connection();
    }
}
