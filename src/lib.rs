//! asyncserial
//!
//! Cooperative, non-blocking serial port access for Tokio applications. A
//! blocking serial driver is switched to zero timeouts and polled at a short
//! interval; between polls the calling task yields so other work keeps
//! running on the same runtime.
//!
//! # Modules
//!
//! - `port`: driver abstraction, mock driver and the polling `AsyncSerial` adapter
//! - `config`: configuration management with TOML support

pub mod config;
pub mod port;

// Re-export commonly used types for convenience
pub use port::{
    AsyncSerial, DataBits, FlowControl, MockSerialPort, Parity, PollSettings, PortConfiguration,
    PortError, Scheduler, SerialHandle, StopBits, SyncSerialPort, TokioScheduler, YieldScheduler,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
