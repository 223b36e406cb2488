//! Example demonstrating cooperative serial I/O with `AsyncSerial`.
//!
//! A simulated loopback port is driven from one task while a second task keeps
//! ticking on the same single-threaded runtime, showing that the poll loops
//! yield instead of blocking. Set `DEMO_PORT` to a port with TX wired to RX to
//! run the same exchange against hardware.
//!
//! Run with:
//! ```bash
//! cargo run --example async_serial_usage
//! DEMO_PORT=/dev/ttyUSB0 cargo run --example async_serial_usage
//! ```

use asyncserial::port::{
    AsyncSerial, MockSerialPort, PortConfiguration, SerialHandle, TokioScheduler,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("AsyncSerial Usage Example");
    println!("=========================\n");

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = Arc::clone(&ticks);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(1)).await;
                ticks.fetch_add(1, Ordering::Relaxed);
            }
        })
    };

    match std::env::var("DEMO_PORT") {
        Ok(name) => {
            println!("Using hardware port {}", name);
            let config = PortConfiguration::with_baud(115200);
            let port = AsyncSerial::open(&name, &config, Arc::new(TokioScheduler))?;
            exchange(port).await?;
        }
        Err(_) => {
            println!("Using a simulated loopback port (set DEMO_PORT for hardware)");
            let mock = MockSerialPort::loopback("SIM0");
            // Transmit slowly so the reads have to wait.
            mock.set_tx_chunk(2);
            let port = AsyncSerial::new(mock, Arc::new(TokioScheduler))?;
            exchange(port).await?;
        }
    }

    ticker.abort();
    println!(
        "\nThe ticker task ran {} times while the port was busy",
        ticks.load(Ordering::Relaxed)
    );
    Ok(())
}

async fn exchange<H: SerialHandle>(
    mut port: AsyncSerial<H>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("✓ Port ready: {}", port.name());

    port.write(b"Hello World!\r\n", true).await?;
    let line = port.readline().await?;
    println!("✓ Line echoed: {:?}", String::from_utf8_lossy(&line));

    let payload: Vec<u8> = (0..=255).collect();
    port.write(&payload, false).await?;
    let echoed = port.read(payload.len()).await?;
    println!("✓ {} bytes echoed, identical: {}", echoed.len(), echoed == payload);

    match port.read_timeout(1, Duration::from_millis(20)).await {
        Ok(extra) => println!("✗ Unexpected extra byte: {:?}", extra),
        Err(e) => println!("✓ Nothing more to read: {}", e),
    }

    port.close().await?;
    println!("✓ Port closed, open = {}", port.is_open());
    Ok(())
}
