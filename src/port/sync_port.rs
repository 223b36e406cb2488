//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own `SerialHandle`
//! trait so the polling adapter can drive real hardware.

use super::error::PortError;
use super::traits::{read_queued, PortConfiguration, SerialHandle};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::debug;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port; `None` once closed.
    port: Option<Box<dyn serialport::SerialPort>>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// The port starts with the driver's blocking default timeout; the
    /// adapter switches it to non-blocking mode.
    ///
    /// # Example
    /// ```no_run
    /// use asyncserial::port::{SyncSerialPort, PortConfiguration};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &PortConfiguration::with_baud(115200))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .flow_control(config.flow_control.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .open()
            .map_err(|e| PortError::from_open(port_name, e))?;

        debug!("Opened {} at {} baud", port_name, config.baud_rate);

        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }

    /// Get a reference to the underlying serialport implementation.
    pub fn as_raw(&self) -> Option<&dyn serialport::SerialPort> {
        self.port.as_deref()
    }

    fn port(&self) -> Result<&dyn serialport::SerialPort, PortError> {
        self.port.as_deref().ok_or(PortError::NotOpen)
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, PortError> {
        self.port.as_mut().ok_or(PortError::NotOpen)
    }
}

/// A zero-timeout driver reports "nothing right now" through these kinds.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

impl SerialHandle for SyncSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), PortError> {
        // serialport keeps one timeout for both directions.
        self.port_mut()?
            .set_timeout(read.min(write))
            .map_err(PortError::Serial)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        match self.port_mut()?.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if is_transient(e.kind()) => Ok(0),
            Err(e) => Err(PortError::Device(e)),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        match self.port_mut()?.write(data) {
            Ok(n) => Ok(n),
            Err(e) if is_transient(e.kind()) => Ok(0),
            Err(e) => Err(PortError::Device(e)),
        }
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn bytes_to_write(&self) -> Result<usize, PortError> {
        Ok(self.port()?.bytes_to_write()? as usize)
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        self.port()?
            .clear(serialport::ClearBuffer::Output)
            .map_err(PortError::Serial)
    }

    /// One read of everything queued; the adapter splits at the terminator.
    fn read_until(&mut self, _terminator: u8, line: &mut Vec<u8>) -> Result<usize, PortError> {
        read_queued(self, line)
    }

    fn close(&mut self) -> Result<(), PortError> {
        // Dropping the boxed port releases the file descriptor / handle.
        if self.port.take().is_some() {
            debug!("Closed {}", self.name);
        }
        Ok(())
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field(
                "baud_rate",
                &self.port.as_ref().and_then(|p| p.baud_rate().ok()),
            )
            .field("open", &self.port.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_error() {
        let result = SyncSerialPort::open(
            "/dev/nonexistent_port_12345",
            &PortConfiguration::default(),
        );

        match result {
            Err(PortError::NotFound(name)) => assert!(name.contains("nonexistent")),
            Err(e) => assert!(e.is_open_error(), "Expected an open error, got: {:?}", e),
            Ok(_) => panic!("Opening a nonexistent port must fail"),
        }
    }

    #[test]
    fn test_transient_kinds() {
        assert!(is_transient(ErrorKind::WouldBlock));
        assert!(is_transient(ErrorKind::TimedOut));
        assert!(is_transient(ErrorKind::Interrupted));
        assert!(!is_transient(ErrorKind::BrokenPipe));
        assert!(!is_transient(ErrorKind::PermissionDenied));
    }
}
