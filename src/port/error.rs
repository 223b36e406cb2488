//! Port-specific error types.
//!
//! Errors fall into two groups: failures to open or configure a port, which
//! only the constructors return, and device failures reported by the driver
//! while a port is in use. Neither group is retried by the adapter.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The driver rejected the requested port parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The driver could not open the port.
    #[error("Failed to open serial port '{port}': {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// The device reported an I/O failure (unplugged, permission revoked).
    #[error("Device error: {0}")]
    Device(#[from] std::io::Error),

    /// A serialport-specific error occurred on an open port.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Attempted to use a port that has been closed.
    #[error("Port is not open")]
    NotOpen,

    /// A deadline-bounded operation did not complete in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// No line terminator arrived within the configured line length.
    #[error("Line exceeded {0} bytes without a terminator")]
    LineTooLong(usize),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Map a driver error raised while opening `port_name`.
    pub fn from_open(port_name: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::not_found(port_name),
            serialport::ErrorKind::InvalidInput => Self::config(err.to_string()),
            _ => Self::Open {
                port: port_name.to_string(),
                source: err,
            },
        }
    }

    /// Map a failure raised while configuring an opened port.
    ///
    /// Driver and I/O failures become [`PortError::Open`]; errors that are
    /// already construction-time kinds, and `NotOpen`, pass through.
    pub fn from_configure(port_name: &str, err: PortError) -> Self {
        let source = match err {
            Self::Serial(source) => source,
            Self::Device(io) => serialport::Error::from(io),
            e @ (Self::Timeout(_) | Self::LineTooLong(_)) => {
                serialport::Error::new(serialport::ErrorKind::Unknown, e.to_string())
            }
            other => return other,
        };
        Self::Open {
            port: port_name.to_string(),
            source,
        }
    }

    /// True for construction-time failures.
    pub fn is_open_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Config(_) | Self::Open { .. })
    }

    /// True for runtime I/O failures reported by the driver.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::Device(_) | Self::Serial(_))
    }
}
