//! Configuration module for asyncserial.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `ASYNCSERIAL_CONFIG` environment variable (explicit path)
//! 2. `./asyncserial.toml` (current directory)
//! 3. `~/.config/asyncserial/config.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\asyncserial\config.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `ASYNCSERIAL_<SECTION>_<KEY>`
//!
//! Examples:
//! - `ASYNCSERIAL_SERIAL_PORT=/dev/ttyUSB0`
//! - `ASYNCSERIAL_SERIAL_BAUD_RATE=921600`
//! - `ASYNCSERIAL_POLLING_INTERVAL_US=250`
//! - `ASYNCSERIAL_LOGGING_FORMAT=json`
//!
//! # Example
//!
//! ```rust,no_run
//! use asyncserial::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//!
//! println!("Baud rate: {}", config.serial.baud_rate);
//! println!("Poll interval: {:?}", config.polling.interval());
//! # Ok::<(), asyncserial::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, PollingConfig, SerialConfig};
