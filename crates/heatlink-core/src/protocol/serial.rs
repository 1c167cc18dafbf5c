//! Serial port handling
//!
//! Provides low-level serial port access for the heat pump link.

use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::debug;

use super::link::Link;
use super::SUPPORTED_BAUD_RATES;
use crate::error::{Error, Result};

/// Blocking read timeout of the port itself. Kept short so the line reader
/// can enforce its own deadline.
const PORT_READ_TIMEOUT_MS: u64 = 100;

/// Reject baud rates the controller does not support
pub fn check_baud_rate(baud_rate: u32) -> Result<()> {
    if SUPPORTED_BAUD_RATES.contains(&baud_rate) {
        Ok(())
    } else {
        Err(Error::Connection(format!(
            "unsupported baud rate {} (supported: {:?})",
            baud_rate, SUPPORTED_BAUD_RATES
        )))
    }
}

/// Open and configure a serial port for the heat pump
pub fn open_port(name: &str, baud_rate: u32) -> Result<SerialLink> {
    check_baud_rate(baud_rate)?;

    let mut port = serialport::new(name, baud_rate)
        .timeout(Duration::from_millis(PORT_READ_TIMEOUT_MS))
        .open()
        .map_err(|e| Error::Connection(format!("cannot open {}: {}", name, e)))?;

    configure_port(port.as_mut())?;
    clear_buffers(port.as_mut())?;
    debug!("Opened {} at {} baud", name, baud_rate);

    Ok(SerialLink { port })
}

/// Standard 8N1 configuration without flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<()> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(serial_error)?;
    port.set_parity(serialport::Parity::None)
        .map_err(serial_error)?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(serial_error)?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(serial_error)?;
    Ok(())
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<()> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(serial_error)
}

fn serial_error(e: serialport::Error) -> Error {
    Error::Connection(e.to_string())
}

/// [`Link`] backed by a real serial port
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Port name as reported by the driver
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Link for SerialLink {
    fn clear_input(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }
}
