//! Port abstraction layer for serial communication.
//!
//! `SerialHandle` describes the blocking driver primitives, implemented for
//! real hardware by `SyncSerialPort` and for tests by `MockSerialPort`.
//! `AsyncSerial` turns any handle into a suspend-capable port by polling it
//! and yielding through a `Scheduler` in between.

pub mod async_serial;
pub mod error;
pub mod mock;
pub mod scheduler;
pub mod sync_port;
pub mod traits;

pub use async_serial::AsyncSerial;
pub use error::PortError;
pub use mock::MockSerialPort;
pub use scheduler::{Scheduler, TokioScheduler, YieldScheduler};
pub use sync_port::*;
pub use traits::*;

/// Describe the serial ports present on this system.
pub fn available_ports() -> Result<Vec<serialport::SerialPortInfo>, PortError> {
    serialport::available_ports().map_err(PortError::Serial)
}
