use anyhow::{bail, Context};
use asyncserial::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use asyncserial::port::{self, AsyncSerial, SyncSerialPort, TokioScheduler};
use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Talk to a serial port from a cooperative Tokio runtime.",
    long_about = "Opens a serial port through the blocking driver, switches it to non-blocking mode and polls it at a short interval, yielding to other tasks in between."
)]
struct Args {
    /// Configuration file (overrides the standard lookup).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port name or alias (overrides serial.port).
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Baud rate (overrides serial.baud_rate).
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Poll interval in microseconds (overrides polling.interval_us).
    #[arg(long, global = true)]
    interval_us: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports present on this system.
    List {
        /// Print the list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write data to the port and wait until it has been transmitted.
    Send {
        /// Text to send.
        data: String,
        /// Append the configured line terminator.
        #[arg(long)]
        line: bool,
        /// Wait for one reply line and print it.
        #[arg(long)]
        reply: bool,
    },
    /// Print incoming lines until interrupted.
    Monitor {
        /// Stop after this many lines.
        #[arg(long)]
        count: Option<usize>,
    },
    /// Self-test for a port whose TX is wired to its RX.
    Loopback {
        /// Number of random payloads to send.
        #[arg(long, default_value_t = 3)]
        rounds: usize,
        /// Largest payload in bytes (1..=256).
        #[arg(long, default_value_t = 256)]
        max_len: usize,
    },
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.logging);

    match args.command {
        Command::List { json } => list_ports(json),
        Command::Send { data, line, reply } => {
            let mut port = open_port(&config, args.port.as_deref())?;
            let result = send(&mut port, &config, data, line, reply).await;
            finish(port, result).await
        }
        Command::Monitor { count } => {
            let mut port = open_port(&config, args.port.as_deref())?;
            let result = tokio::select! {
                res = monitor(&mut port, count) => res,
                _ = signal::ctrl_c() => {
                    info!("Interrupted, closing port");
                    Ok(())
                }
            };
            finish(port, result).await
        }
        Command::Loopback { rounds, max_len } => {
            if !(1..=256).contains(&max_len) {
                bail!("--max-len must be between 1 and 256");
            }
            let mut port = open_port(&config, args.port.as_deref())?;
            let result = loopback(&mut port, rounds, max_len).await;
            finish(port, result).await
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load().context("loading configuration")?,
    };

    let mut config = loader.into_config();
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(interval_us) = args.interval_us {
        config.polling.interval_us = interval_us;
    }
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn open_port(config: &Config, port: Option<&str>) -> anyhow::Result<AsyncSerial<SyncSerialPort>> {
    let Some(name) = port.or(config.serial.port.as_deref()) else {
        bail!("no serial port given; pass --port or set serial.port");
    };
    let name = config.serial.resolve_port(name);

    let port = AsyncSerial::open_with_settings(
        &name,
        &config.serial.port_configuration(),
        Arc::new(TokioScheduler),
        config.polling.to_poll_settings()?,
    )?;
    Ok(port)
}

/// Close gracefully, preferring the operation's own error over a close error.
async fn finish(
    mut port: AsyncSerial<SyncSerialPort>,
    result: anyhow::Result<()>,
) -> anyhow::Result<()> {
    if let Err(e) = port.close().await {
        warn!("Graceful close of {} failed: {}", port.name(), e);
        port.abort()?;
        result?;
        return Err(e.into());
    }
    result
}

fn list_ports(json: bool) -> anyhow::Result<()> {
    let ports = port::available_ports()?;

    if json {
        let entries: Vec<_> = ports
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.port_name,
                    "type": port_type(&p.port_type),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports detected on this system");
    }
    for p in &ports {
        println!("{:<24} {}", p.port_name, port_type(&p.port_type));
    }
    Ok(())
}

fn port_type(kind: &serialport::SerialPortType) -> String {
    match kind {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "usb {:04x}:{:04x} {}",
            usb.vid,
            usb.pid,
            usb.product.as_deref().unwrap_or("")
        ),
        serialport::SerialPortType::PciPort => "pci".to_string(),
        serialport::SerialPortType::BluetoothPort => "bluetooth".to_string(),
        serialport::SerialPortType::Unknown => "unknown".to_string(),
    }
}

async fn send(
    port: &mut AsyncSerial<SyncSerialPort>,
    config: &Config,
    data: String,
    line: bool,
    reply: bool,
) -> anyhow::Result<()> {
    let mut payload = data.into_bytes();
    if line {
        payload.push(config.polling.to_poll_settings()?.line_terminator);
    }

    port.write(&payload, true).await?;
    info!("Sent {} bytes to {}", payload.len(), port.name());

    if reply {
        let answer = port.readline().await?;
        println!("{}", String::from_utf8_lossy(&answer).trim_end());
    }
    Ok(())
}

async fn monitor(
    port: &mut AsyncSerial<SyncSerialPort>,
    count: Option<usize>,
) -> anyhow::Result<()> {
    let mut seen = 0;
    while count.map_or(true, |limit| seen < limit) {
        let line = port.readline().await?;
        println!("{}", String::from_utf8_lossy(&line).trim_end());
        seen += 1;
    }
    Ok(())
}

async fn loopback(
    port: &mut AsyncSerial<SyncSerialPort>,
    rounds: usize,
    max_len: usize,
) -> anyhow::Result<()> {
    let alphabet: Vec<u8> = (0..=255).collect();
    let mut rng = rand::thread_rng();

    for round in 1..=rounds {
        let len = max_len * round / rounds.max(1);
        let len = len.clamp(1, max_len);
        let payload: Vec<u8> = alphabet
            .choose_multiple(&mut rng, len)
            .copied()
            .collect();

        port.write(&payload, true).await?;
        let echoed = port.read(payload.len()).await?;
        if echoed != payload {
            bail!("round {}: {} bytes sent, echo differs", round, len);
        }
        println!("round {}: {} bytes echoed", round, len);
    }
    Ok(())
}
