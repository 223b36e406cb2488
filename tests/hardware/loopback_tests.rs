//! Loopback tests against a real USB serial converter.
//!
//! Short RxD and TxD on the converter, then run:
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0
//! export TEST_BAUD=921600                # optional, this is the default
//! cargo test --features hardware-tests -- --ignored
//! ```
//!
//! Each test opens and closes the port itself, so run them with
//! `--test-threads=1` or rely on the `#[serial]` markers.

use super::utils::{open_test_port, TimingHelper};
use crate::common::random_payload;
use serial_test::serial;
use std::time::Duration;

/// Time for the input queue to catch up after the output queue drained.
const SETTLE: Duration = Duration::from_millis(200);

#[tokio::test]
#[ignore]
#[serial]
async fn test_await_write() {
    let Some(mut port) = open_test_port() else {
        return;
    };

    for n in [100, 200, 256] {
        port.write(&random_payload(n), true).await.unwrap();
        assert_eq!(port.out_waiting().unwrap(), 0);

        // Cleanup for the next round.
        tokio::time::sleep(SETTLE).await;
        port.read(0).await.unwrap();
    }
    port.close().await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_n_write_n_read() {
    let Some(mut port) = open_test_port() else {
        return;
    };

    let timer = TimingHelper::new("1..=256 byte round trips");
    for n in 1..=256 {
        let payload = random_payload(n);
        port.write(&payload, false).await.unwrap();
        assert_eq!(port.read(n).await.unwrap(), payload, "length {}", n);
    }
    timer.finish();
    port.close().await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_read_all() {
    let Some(mut port) = open_test_port() else {
        return;
    };

    for n in [100, 200, 256] {
        let payload = random_payload(n);
        port.write(&payload, true).await.unwrap();
        tokio::time::sleep(SETTLE).await;
        assert_eq!(port.read(0).await.unwrap(), payload);
    }
    port.close().await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_flush_2048() {
    let Some(mut port) = open_test_port() else {
        return;
    };

    port.write(&[b'a'; 2048], false).await.unwrap();
    port.flush().await.unwrap();
    assert_eq!(port.out_waiting().unwrap(), 0);

    tokio::time::sleep(SETTLE).await;
    assert_eq!(port.in_waiting().unwrap(), 2048);
    port.read(0).await.unwrap();
    port.close().await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_readline() {
    let Some(mut port) = open_test_port() else {
        return;
    };

    let lines: [&[u8]; 3] = [
        b"Hello World!",
        b"This is ASYNCSERIAL",
        b"\x13\x17 LEET \xbe\xef",
    ];
    for line in lines {
        let mut expected = line.to_vec();
        expected.extend_from_slice(b"\r\n");

        port.write(&expected, true).await.unwrap();
        assert_eq!(port.readline().await.unwrap(), expected);
    }
    port.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
#[ignore]
#[serial]
async fn test_read_does_not_block_runtime() {
    let Some(mut port) = open_test_port() else {
        return;
    };

    let ticker = tokio::spawn(async {
        let mut ticks = 0u32;
        loop {
            tokio::time::sleep(Duration::from_millis(1)).await;
            ticks += 1;
            if ticks == 5 {
                return ticks;
            }
        }
    });

    // Nothing is sent, so the read only ends through the deadline.
    let result = port.read_timeout(1, Duration::from_millis(50)).await;
    assert!(result.is_err());
    assert_eq!(ticker.await.unwrap(), 5);
    port.close().await.unwrap();
}
