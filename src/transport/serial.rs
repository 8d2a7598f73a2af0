//! Serial transport for RS-232/USB-serial instruments.
//!
//! Wraps the `serialport` crate behind the [`Transport`] trait. The port is
//! opened with a short internal read timeout so that `read_bytes` behaves as
//! a non-blocking poll: a quiet device yields `Ok(None)` rather than hanging
//! the caller. Line terminator and response delimiter default to the values
//! both rig instruments use (`\n` either way) and can be adjusted with the
//! builder-style `with_*` methods.

use crate::error::{AppResult, DaqError};
use crate::transport::Transport;
use log::{debug, trace};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// Internal poll timeout on the underlying port. Short on purpose: the
/// reliable reader's retry budget supplies the patience, not the port.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Default overall deadline for collecting one textual response.
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Serial implementation of [`Transport`].
pub struct SerialTransport {
    port_name: String,
    port: Box<dyn SerialPort>,
    line_terminator: String,
    response_delimiter: u8,
    response_timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port at the given path and baud rate.
    pub fn open(port_name: &str, baud_rate: u32) -> AppResult<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(POLL_TIMEOUT)
            .open()?;

        debug!("Serial port '{}' opened at {} baud", port_name, baud_rate);

        Ok(Self {
            port_name: port_name.to_string(),
            port,
            line_terminator: "\n".to_string(),
            response_delimiter: b'\n',
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        })
    }

    /// Set the line terminator appended to outgoing commands.
    pub fn with_line_terminator(mut self, terminator: &str) -> Self {
        self.line_terminator = terminator.to_string();
        self
    }

    /// Set the byte that ends an incoming textual response.
    pub fn with_response_delimiter(mut self, delimiter: u8) -> Self {
        self.response_delimiter = delimiter;
        self
    }

    /// Set the overall deadline for collecting one textual response.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Port path this transport was opened on.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Transport for SerialTransport {
    fn write_message(&mut self, text: &str) -> AppResult<()> {
        let cmd = format!("{}{}", text, self.line_terminator);
        trace!("{} <- '{}'", self.port_name, cmd.escape_default());

        self.port.write_all(cmd.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }

    fn read_bytes(&mut self, max_len: usize) -> AppResult<Option<Vec<u8>>> {
        let mut buffer = vec![0u8; max_len];
        match self.port.read(&mut buffer) {
            Ok(0) => Ok(None),
            Ok(n) => {
                buffer.truncate(n);
                trace!("{} -> {} raw bytes", self.port_name, n);
                Ok(Some(buffer))
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_message(&mut self) -> AppResult<String> {
        let mut response = Vec::new();
        let mut buffer = [0u8; 1];
        let start = Instant::now();

        loop {
            if start.elapsed() > self.response_timeout {
                return Err(DaqError::Io(std::io::Error::new(
                    ErrorKind::TimedOut,
                    format!(
                        "no response terminator from '{}' within {:?}",
                        self.port_name, self.response_timeout
                    ),
                )));
            }

            match self.port.read(&mut buffer) {
                Ok(1) => {
                    response.push(buffer[0]);
                    if buffer[0] == self.response_delimiter {
                        break;
                    }
                }
                // EOF should not happen on a serial port; keep polling.
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let text = String::from_utf8_lossy(&response).into_owned();
        trace!("{} -> '{}'", self.port_name, text.escape_default());
        Ok(text)
    }
}
