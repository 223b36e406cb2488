//! Utility functions for hardware testing.
//!
//! Provides the environment-driven port configuration, a fixture that opens
//! the adapter on the test port, and timing helpers.

use asyncserial::port::{AsyncSerial, PortConfiguration, SyncSerialPort, TokioScheduler};
use serialport::{available_ports, SerialPortInfo};
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Highest rate of common FTDI converters; keeps the loopback runs short.
pub const DEFAULT_TEST_BAUD: u32 = 921_600;

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
}

impl TestPortConfig {
    /// Get test configuration from `TEST_PORT` and `TEST_BAUD`.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TEST_BAUD);

        Some(TestPortConfig {
            port_name,
            baud_rate,
        })
    }

    /// Create a port configuration for testing.
    pub fn to_port_config(&self) -> PortConfiguration {
        PortConfiguration::with_baud(self.baud_rate)
    }
}

/// Discover all available serial ports on the system.
pub fn discover_available_ports() -> Vec<SerialPortInfo> {
    available_ports().unwrap_or_default()
}

/// Open the adapter on the configured test port.
///
/// Returns `None` (after printing why) when `TEST_PORT` is unset.
pub fn open_test_port() -> Option<AsyncSerial<SyncSerialPort>> {
    let Some(config) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT environment variable not set");
        println!("   Set TEST_PORT=/dev/ttyUSB0 (or COM3) with TX wired to RX");
        return None;
    };

    println!(
        "Opening {} at {} baud",
        config.port_name, config.baud_rate
    );
    let port = AsyncSerial::open(
        &config.port_name,
        &config.to_port_config(),
        Arc::new(TokioScheduler),
    )
    .unwrap_or_else(|e| panic!("failed to open {}: {}", config.port_name, e));
    Some(port)
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("⏱️  Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("✅ Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_ports() {
        // Should not panic
        let ports = discover_available_ports();
        println!("Found {} ports", ports.len());
    }

    #[test]
    fn test_timing_helper() {
        let timer = TimingHelper::new("test operation");
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }
}
