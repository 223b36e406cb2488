//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::port::{DataBits, FlowControl, Parity, PollSettings, PortConfiguration, StopBits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Polling behaviour of the adapter
    pub polling: PollingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values the driver and the adapter would reject later.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation(
                "serial.baud_rate",
                "must be greater than zero",
            ));
        }
        self.polling.to_poll_settings()?;
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port to use when none is given on the command line
    pub port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: DataBits,
    /// Parity checking
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Flow control
    pub flow_control: FlowControl,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let hardware = PortConfiguration::default();
        Self {
            port: None,
            baud_rate: 115200,
            data_bits: hardware.data_bits,
            parity: hardware.parity,
            stop_bits: hardware.stop_bits,
            flow_control: hardware.flow_control,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Hardware parameters to hand to the driver.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            flow_control: self.flow_control,
            parity: self.parity,
            stop_bits: self.stop_bits,
        }
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Polling configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Pause between two polls in microseconds
    pub interval_us: u64,
    /// Single character that ends a line for readline
    pub line_terminator: String,
    /// Longest line readline assembles; unlimited when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_line_length: Option<usize>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let settings = PollSettings::default();
        Self {
            interval_us: settings.interval.as_micros() as u64,
            line_terminator: (settings.line_terminator as char).to_string(),
            max_line_length: settings.max_line_length,
        }
    }
}

impl PollingConfig {
    /// Get the poll interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_micros(self.interval_us)
    }

    /// Convert to adapter settings, validating every field.
    pub fn to_poll_settings(&self) -> ConfigResult<PollSettings> {
        if self.interval_us == 0 {
            return Err(ConfigError::validation(
                "polling.interval_us",
                "must be greater than zero",
            ));
        }

        let line_terminator = match self.line_terminator.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(ConfigError::validation(
                    "polling.line_terminator",
                    "must be exactly one byte",
                ))
            }
        };

        if self.max_line_length == Some(0) {
            return Err(ConfigError::validation(
                "polling.max_line_length",
                "must be greater than zero",
            ));
        }

        Ok(PollSettings {
            interval: self.interval(),
            line_terminator,
            max_line_length: self.max_line_length,
        })
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{}'", other),
            )),
        }
    }
}
