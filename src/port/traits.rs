//! Core traits for serial port abstraction.
//!
//! Defines the `SerialHandle` trait, the set of blocking driver primitives the
//! polling adapter is built from, so that real serial ports and mock
//! implementations can be used interchangeably.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pause between two polls of the driver.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(500);

/// Default line terminator used by `readline`.
pub const DEFAULT_LINE_TERMINATOR: u8 = b'\n';

/// Hardware parameters for a serial port, forwarded unchanged to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Flow control mode.
    pub flow_control: FlowControl,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of stop bits.
    pub stop_bits: StopBits,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            flow_control: FlowControl::None,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl PortConfiguration {
    /// Default 8N1 configuration at the given baud rate.
    pub fn with_baud(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

/// Polling behaviour of the adapter. Fixed for the lifetime of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// How long to suspend between two readiness checks.
    pub interval: Duration,
    /// Byte that ends a line for `readline`.
    pub line_terminator: u8,
    /// Longest line `readline` assembles, terminator included. `None` lets a
    /// line grow without limit.
    pub max_line_length: Option<usize>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            line_terminator: DEFAULT_LINE_TERMINATOR,
            max_line_length: None,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Blocking serial driver primitives.
///
/// Once `set_timeouts(Duration::ZERO, Duration::ZERO)` has been applied every
/// call must return immediately: reads hand back whatever is queued (possibly
/// nothing), writes accept as much as the driver buffer takes.
pub trait SerialHandle: Send + std::fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Whether the port is still open.
    fn is_open(&self) -> bool;

    /// Set the read and write timeouts of the driver.
    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), PortError>;

    /// Read queued bytes into `buffer`. Returns 0 when nothing is queued.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Hand bytes to the driver. Returns how many were accepted.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Number of received bytes waiting to be read (`in_waiting`).
    fn bytes_to_read(&self) -> Result<usize, PortError>;

    /// Number of bytes not yet transmitted (`out_waiting`).
    fn bytes_to_write(&self) -> Result<usize, PortError>;

    /// Discard everything still waiting in the output queue.
    fn clear_output(&mut self) -> Result<(), PortError>;

    /// Close the port. Closing an already closed port is a no-op.
    fn close(&mut self) -> Result<(), PortError>;

    /// Line-read primitive: append queued bytes to `line`, stopping no
    /// earlier than `terminator`.
    ///
    /// Returns the number of bytes appended, which is 0 when nothing is
    /// queued. The default reads one byte at a time and stops right after the
    /// terminator. Drivers where a read is expensive may append everything
    /// queued instead (see [`read_queued`]); the adapter keeps bytes past the
    /// terminator for the next call.
    fn read_until(&mut self, terminator: u8, line: &mut Vec<u8>) -> Result<usize, PortError> {
        let mut appended = 0;
        let mut byte = [0u8; 1];
        while self.read_bytes(&mut byte)? == 1 {
            line.push(byte[0]);
            appended += 1;
            if byte[0] == terminator {
                break;
            }
        }
        Ok(appended)
    }
}

/// Append every byte the driver reports as queued to `buffer` in one read.
///
/// Returns the number of bytes appended.
pub fn read_queued<H: SerialHandle + ?Sized>(
    handle: &mut H,
    buffer: &mut Vec<u8>,
) -> Result<usize, PortError> {
    let queued = handle.bytes_to_read()?;
    if queued == 0 {
        return Ok(0);
    }

    let start = buffer.len();
    buffer.resize(start + queued, 0);
    let result = handle.read_bytes(&mut buffer[start..]);
    buffer.truncate(start + *result.as_ref().unwrap_or(&0));
    result
}

impl<H: SerialHandle + ?Sized> SerialHandle for Box<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), PortError> {
        (**self).set_timeouts(read, write)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        (**self).read_bytes(buffer)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        (**self).bytes_to_read()
    }

    fn bytes_to_write(&self) -> Result<usize, PortError> {
        (**self).bytes_to_write()
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        (**self).clear_output()
    }

    fn close(&mut self) -> Result<(), PortError> {
        (**self).close()
    }

    fn read_until(&mut self, terminator: u8, line: &mut Vec<u8>) -> Result<usize, PortError> {
        (**self).read_until(terminator, line)
    }
}
