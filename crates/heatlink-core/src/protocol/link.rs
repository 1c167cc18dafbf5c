//! Line framing over a byte link
//!
//! Requests go out as one CR/LF terminated line; responses are read back one
//! line at a time against a deadline.

use std::io::{self, ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::MAX_LINE_LENGTH;
use crate::error::{Error, ProtocolError, Result};

/// Sleep between polls when the link has nothing to offer
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Byte stream to the controller
pub trait Link: Read + Write + Send {
    /// Drop any unread input
    fn clear_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Write `text` followed by CR/LF
pub fn write_line(link: &mut dyn Link, text: &str) -> Result<()> {
    let mut bytes = Vec::with_capacity(text.len() + 2);
    bytes.extend_from_slice(text.as_bytes());
    bytes.extend_from_slice(b"\r\n");
    link.write_all(&bytes)
        .and_then(|_| link.flush())
        .map_err(|e| Error::Connection(format!("write failed: {}", e)))
}

/// Splits incoming bytes into lines, keeping any bytes past the last newline
#[derive(Debug, Default)]
pub struct LineReader {
    pending: Vec<u8>,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget buffered input, both here and in the link
    pub fn discard(&mut self, link: &mut dyn Link) {
        if !self.pending.is_empty() {
            debug!("Discarding {} stale bytes", self.pending.len());
            self.pending.clear();
        }
        if let Err(e) = link.clear_input() {
            debug!("Clearing link input failed: {}", e);
        }
    }

    /// Block until a non-empty line arrives or `timeout` elapses
    pub fn read_line(&mut self, link: &mut dyn Link, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut buffer = [0u8; 256];

        loop {
            while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if line.is_empty() {
                    trace!("Skipping empty line");
                    continue;
                }
                return Ok(decode_line(line));
            }

            if self.pending.len() > MAX_LINE_LENGTH {
                self.pending.clear();
                return Err(ProtocolError::LineTooLong(MAX_LINE_LENGTH).into());
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout));
            }

            match link.read(&mut buffer) {
                Ok(0) => thread::sleep(POLL_INTERVAL),
                Ok(n) => {
                    trace!("Read {} bytes: {:02x?}", n, &buffer[..n]);
                    self.pending.extend_from_slice(&buffer[..n]);
                }
                Err(ref e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) => {}
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(Error::Connection(format!("read failed: {}", e))),
            }
        }
    }
}

/// UTF-8 when valid, otherwise Latin-1
fn decode_line(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}
