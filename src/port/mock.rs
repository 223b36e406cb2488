//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates a blocking driver in
//! non-blocking mode without requiring actual hardware. Time is simulated by
//! driver queries: every `bytes_to_read`/`bytes_to_write` call advances the
//! simulation by one step, releasing the next incoming fragment and
//! transmitting the next chunk of the output queue.

use super::error::PortError;
use super::traits::SerialHandle;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock port, shared between clones.
#[derive(Debug)]
struct MockPortState {
    /// Bytes received and readable right now.
    read_queue: VecDeque<u8>,
    /// Fragments that arrive one per simulation step.
    incoming: VecDeque<Vec<u8>>,
    /// Bytes accepted by the driver but not yet transmitted.
    out_queue: VecDeque<u8>,
    /// Everything that left the port, in order.
    transmitted: Vec<u8>,
    /// Bytes transmitted per simulation step.
    tx_chunk: usize,
    /// Upper bound on bytes accepted by one `write_bytes` call.
    accept_limit: Option<usize>,
    /// Route transmitted bytes back into the read queue.
    loopback: bool,
    /// Number of upcoming reads that return nothing despite queued data.
    empty_reads: usize,
    /// Failure returned by the next driver call.
    next_failure: Option<io::ErrorKind>,
    /// Every driver call fails once set.
    disconnected: bool,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    open: bool,
    /// Number of simulation steps taken so far.
    steps: usize,
}

impl Default for MockPortState {
    fn default() -> Self {
        Self {
            read_queue: VecDeque::new(),
            incoming: VecDeque::new(),
            out_queue: VecDeque::new(),
            transmitted: Vec::new(),
            tx_chunk: usize::MAX,
            accept_limit: None,
            loopback: false,
            empty_reads: 0,
            next_failure: None,
            disconnected: false,
            read_timeout: None,
            write_timeout: None,
            open: true,
            steps: 0,
        }
    }
}

impl MockPortState {
    fn check(&mut self) -> Result<(), PortError> {
        if !self.open {
            return Err(PortError::NotOpen);
        }
        if self.disconnected {
            return Err(PortError::Device(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device disconnected",
            )));
        }
        if let Some(kind) = self.next_failure.take() {
            return Err(PortError::Device(io::Error::new(kind, "injected failure")));
        }
        Ok(())
    }

    fn step(&mut self) {
        self.steps += 1;
        if let Some(fragment) = self.incoming.pop_front() {
            self.read_queue.extend(fragment);
        }
        let n = self.tx_chunk.min(self.out_queue.len());
        let sent: Vec<u8> = self.out_queue.drain(..n).collect();
        if self.loopback {
            self.read_queue.extend(&sent);
        }
        self.transmitted.extend(sent);
    }
}

/// Mock serial port implementation for testing.
///
/// This implementation allows you to:
/// - Enqueue data that is readable immediately or arrives in fragments
/// - Pace transmission of written data and inspect what was sent
/// - Loop transmitted bytes back to the input, like a TX-RX jumper
/// - Simulate partial writes, spurious empty reads and device failures
///
/// # Example
/// ```
/// use asyncserial::port::{MockSerialPort, SerialHandle};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello, World!");
///
/// let mut buffer = [0u8; 13];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello, World!");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.bytes_to_write().unwrap(), 0);
/// assert_eq!(port.transmitted(), b"Response");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared by every clone.
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new, open mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Create a mock port whose transmitted bytes come back as input.
    pub fn loopback(name: impl Into<String>) -> Self {
        let port = Self::new(name);
        port.state.lock().loopback = true;
        port
    }

    /// Make bytes readable immediately.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Queue a fragment that becomes readable at a later simulation step.
    ///
    /// Fragments arrive in order, one per step.
    pub fn enqueue_fragment(&self, data: &[u8]) {
        self.state.lock().incoming.push_back(data.to_vec());
    }

    /// Transmit at most `chunk` bytes of the output queue per step.
    pub fn set_tx_chunk(&self, chunk: usize) {
        self.state.lock().tx_chunk = chunk.max(1);
    }

    /// Accept at most `limit` bytes per `write_bytes` call (0 accepts none).
    pub fn set_accept_limit(&self, limit: Option<usize>) {
        self.state.lock().accept_limit = limit;
    }

    /// Make the next `count` reads return nothing even if data is queued.
    pub fn set_empty_reads(&self, count: usize) {
        self.state.lock().empty_reads = count;
    }

    /// Fail the next driver call with an I/O error of the given kind.
    pub fn fail_next(&self, kind: io::ErrorKind) {
        self.state.lock().next_failure = Some(kind);
    }

    /// Simulate unplugging (or re-plugging) the device.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.lock().disconnected = disconnected;
    }

    /// Everything transmitted so far.
    pub fn transmitted(&self) -> Vec<u8> {
        self.state.lock().transmitted.clone()
    }

    /// Bytes still waiting in the output queue, without advancing time.
    pub fn pending_output(&self) -> usize {
        self.state.lock().out_queue.len()
    }

    /// Bytes readable right now, without advancing time.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Timeouts last applied through `set_timeouts`.
    pub fn timeouts(&self) -> (Option<Duration>, Option<Duration>) {
        let state = self.state.lock();
        (state.read_timeout, state.write_timeout)
    }

    /// Number of simulation steps taken so far.
    pub fn steps(&self) -> usize {
        self.state.lock().steps
    }
}

impl SerialHandle for MockSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.check()?;
        state.read_timeout = Some(read);
        state.write_timeout = Some(write);
        Ok(())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.check()?;

        if state.empty_reads > 0 {
            state.empty_reads -= 1;
            return Ok(0);
        }

        let n = buffer.len().min(state.read_queue.len());
        for (slot, byte) in buffer.iter_mut().zip(state.read_queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.check()?;

        let accepted = state.accept_limit.map_or(data.len(), |l| l.min(data.len()));
        state.out_queue.extend(&data[..accepted]);
        Ok(accepted)
    }

    fn bytes_to_read(&self) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.check()?;
        state.step();
        Ok(state.read_queue.len())
    }

    fn bytes_to_write(&self) -> Result<usize, PortError> {
        let mut state = self.state.lock();
        state.check()?;
        state.step();
        Ok(state.out_queue.len())
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.check()?;
        state.out_queue.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        self.state.lock().open = false;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .field("pending_output", &self.pending_output())
            .finish()
    }
}
