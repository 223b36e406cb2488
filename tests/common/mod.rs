//! Shared test utilities for asyncserial integration tests.
//!
//! This module provides common test infrastructure including:
//! - Mock port creation with pre-programmed input
//! - Adapter construction with counting or yielding schedulers
//! - Random payload generation

#![allow(dead_code)]

use asyncserial::port::{AsyncSerial, MockSerialPort, Scheduler, YieldScheduler};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Create a mock serial port whose input arrives in the given fragments,
/// one fragment per driver poll.
///
/// # Example
/// ```ignore
/// let mock = create_mock_port_with_fragments("MOCK0", &[b"OK", b"\r\n"]);
/// ```
pub fn create_mock_port_with_fragments(port_name: &str, fragments: &[&[u8]]) -> MockSerialPort {
    let mock = MockSerialPort::new(port_name);
    for fragment in fragments {
        mock.enqueue_fragment(fragment);
    }
    mock
}

/// Create a loopback mock that transmits `chunk` bytes per driver poll.
pub fn create_loopback_port(port_name: &str, chunk: usize) -> MockSerialPort {
    let mock = MockSerialPort::loopback(port_name);
    mock.set_tx_chunk(chunk);
    mock
}

/// Wrap a clone of `mock` in an adapter that only yields between polls.
pub fn adapter(mock: &MockSerialPort) -> AsyncSerial<MockSerialPort> {
    AsyncSerial::new(mock.clone(), Arc::new(YieldScheduler)).expect("mock port should configure")
}

/// Scheduler that yields to the runtime and counts pauses.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    pauses: AtomicUsize,
}

impl CountingScheduler {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scheduler for CountingScheduler {
    async fn pause(&self, _interval: Duration) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}

/// Wrap a clone of `mock` in an adapter with a counting scheduler.
pub fn counted_adapter(
    mock: &MockSerialPort,
) -> (AsyncSerial<MockSerialPort>, Arc<CountingScheduler>) {
    let scheduler = Arc::new(CountingScheduler::default());
    let port = AsyncSerial::new(mock.clone(), scheduler.clone())
        .expect("mock port should configure");
    (port, scheduler)
}

/// `n` distinct random bytes, like a shuffled sample of 0..=255.
pub fn random_payload(n: usize) -> Vec<u8> {
    let alphabet: Vec<u8> = (0..=255).collect();
    alphabet
        .choose_multiple(&mut rand::thread_rng(), n.min(256))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use asyncserial::port::SerialHandle;

    #[test]
    fn test_create_mock_port_with_fragments() {
        let mut mock = create_mock_port_with_fragments("MOCK0", &[b"Hello", b"World"]);

        let mut buf = [0u8; 10];
        assert_eq!(mock.read_bytes(&mut buf).unwrap(), 0);

        assert_eq!(mock.bytes_to_read().unwrap(), 5);
        let n = mock.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"Hello");
    }

    #[test]
    fn test_random_payload_is_distinct() {
        let payload = random_payload(256);
        let mut sorted = payload.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 256);
    }
}
