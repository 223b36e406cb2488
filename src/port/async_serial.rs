//! Suspend-capable serial port built on a blocking driver.
//!
//! `AsyncSerial` switches its handle to non-blocking mode and turns every
//! operation into a poll loop: check the driver's byte counts, and when the
//! condition does not hold yet, suspend the task for the poll interval through
//! the injected [`Scheduler`] instead of blocking the thread.
//!
//! Bytes pulled from the driver are staged in an internal buffer until a
//! caller receives them, so a `read` or `readline` that is cancelled at a
//! suspension point (dropped by `tokio::select!` or a timeout) loses nothing:
//! the next call continues where it stopped.

use super::error::PortError;
use super::scheduler::Scheduler;
use super::sync_port::SyncSerialPort;
use super::traits::{PollSettings, PortConfiguration, SerialHandle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Asynchronous serial port that polls a blocking [`SerialHandle`].
///
/// The adapter owns its handle exclusively and every I/O operation takes
/// `&mut self`, so two tasks cannot interleave driver calls on the same port.
/// Share an adapter between tasks by wrapping it in a `tokio::sync::Mutex`.
///
/// # Example
/// ```no_run
/// use asyncserial::port::{AsyncSerial, PortConfiguration, TokioScheduler};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), asyncserial::PortError> {
/// let config = PortConfiguration::with_baud(115200);
/// let mut port = AsyncSerial::open("/dev/ttyUSB0", &config, Arc::new(TokioScheduler))?;
///
/// port.write(b"AT\r\n", true).await?;
/// let reply = port.readline().await?;
/// println!("{}", String::from_utf8_lossy(&reply));
///
/// port.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncSerial<H: SerialHandle = SyncSerialPort> {
    handle: H,
    scheduler: Arc<dyn Scheduler>,
    settings: PollSettings,
    /// Bytes read from the driver but not yet returned to a caller.
    pending: Vec<u8>,
}

impl AsyncSerial<SyncSerialPort> {
    /// Open a hardware port and wrap it with default poll settings.
    pub fn open(
        port_name: &str,
        config: &PortConfiguration,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, PortError> {
        Self::open_with_settings(port_name, config, scheduler, PollSettings::default())
    }

    /// Open a hardware port and wrap it with explicit poll settings.
    pub fn open_with_settings(
        port_name: &str,
        config: &PortConfiguration,
        scheduler: Arc<dyn Scheduler>,
        settings: PollSettings,
    ) -> Result<Self, PortError> {
        let handle = SyncSerialPort::open(port_name, config)?;
        let port = Self::with_settings(handle, scheduler, settings)?;
        info!(
            "Opened {} at {} baud (poll interval {:?})",
            port_name, config.baud_rate, settings.interval
        );
        Ok(port)
    }
}

impl<H: SerialHandle> AsyncSerial<H> {
    /// Wrap an open handle with default poll settings.
    pub fn new(handle: H, scheduler: Arc<dyn Scheduler>) -> Result<Self, PortError> {
        Self::with_settings(handle, scheduler, PollSettings::default())
    }

    /// Wrap an open handle, forcing its timeouts to zero.
    ///
    /// On failure the handle is closed before the error is returned.
    pub fn with_settings(
        mut handle: H,
        scheduler: Arc<dyn Scheduler>,
        settings: PollSettings,
    ) -> Result<Self, PortError> {
        let configured = if settings.interval.is_zero() {
            Err(PortError::config("poll interval must be greater than zero"))
        } else if settings.max_line_length == Some(0) {
            Err(PortError::config("maximum line length must be greater than zero"))
        } else if !handle.is_open() {
            Err(PortError::NotOpen)
        } else {
            handle
                .set_timeouts(Duration::ZERO, Duration::ZERO)
                .map_err(|e| PortError::from_configure(handle.name(), e))
        };

        if let Err(e) = configured {
            if let Err(close_err) = handle.close() {
                debug!("{}: close after failed setup: {}", handle.name(), close_err);
            }
            return Err(e);
        }

        Ok(Self {
            handle,
            scheduler,
            settings,
            pending: Vec::new(),
        })
    }

    /// Name of the underlying port.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// The poll settings fixed at construction.
    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Pause between two polls.
    pub fn poll_interval(&self) -> Duration {
        self.settings.interval
    }

    /// Shared access to the handle. Mutable access is never handed out, so
    /// the non-blocking timeouts cannot be changed behind the adapter's back.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Whether the port is open.
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Bytes available to `read`, including bytes already staged by the adapter.
    pub fn in_waiting(&self) -> Result<usize, PortError> {
        Ok(self.handle.bytes_to_read()? + self.pending.len())
    }

    /// Bytes written but not yet transmitted.
    pub fn out_waiting(&self) -> Result<usize, PortError> {
        self.handle.bytes_to_write()
    }

    /// Write all of `data`.
    ///
    /// When the driver accepts only part of the data, the rest is submitted
    /// again after a poll interval. With `await_drain` the call additionally
    /// waits until the output queue is empty, see [`flush`](Self::flush).
    pub async fn write(&mut self, data: &[u8], await_drain: bool) -> Result<(), PortError> {
        self.ensure_open()?;

        let mut remaining = data;
        while !remaining.is_empty() {
            let accepted = self.handle.write_bytes(remaining)?;
            remaining = &remaining[accepted..];
            if !remaining.is_empty() {
                trace!(
                    "{}: driver accepted {} bytes, {} left",
                    self.name(),
                    accepted,
                    remaining.len()
                );
                self.pause().await;
            }
        }

        if await_drain {
            self.flush().await?;
        }
        Ok(())
    }

    /// Read exactly `bytecount` bytes.
    ///
    /// A `bytecount` of 0 reads whatever is queued at call time, or a single
    /// byte when nothing is. The call suspends until enough bytes arrived; it
    /// never returns fewer or more.
    pub async fn read(&mut self, bytecount: usize) -> Result<Vec<u8>, PortError> {
        self.ensure_open()?;

        let wanted = if bytecount == 0 {
            self.in_waiting()?.max(1)
        } else {
            bytecount
        };

        while self.pending.len() < wanted {
            let shortfall = wanted - self.pending.len();
            let queued = self.handle.bytes_to_read()?;

            if queued > 0 {
                let got = self.pull(queued.min(shortfall))?;
                if got == 0 {
                    // The driver announced bytes it did not deliver.
                    trace!("{}: {} bytes announced, none read", self.name(), queued);
                } else if got == shortfall {
                    break;
                }
            }

            self.pause().await;
        }

        Ok(self.pending.drain(..wanted).collect())
    }

    /// Read one line, terminator included.
    ///
    /// Bytes are accumulated across polls until the configured terminator is
    /// observed; a fragment without terminator is never returned. Bytes after
    /// the terminator stay queued for the next call.
    ///
    /// Without [`PollSettings::max_line_length`] the partial line grows for as
    /// long as the peer sends no terminator. With a limit, the call fails with
    /// [`PortError::LineTooLong`] once that many bytes arrived without one;
    /// those bytes are discarded and anything after them stays queued.
    pub async fn readline(&mut self) -> Result<Vec<u8>, PortError> {
        self.ensure_open()?;

        let terminator = self.settings.line_terminator;
        let limit = self.settings.max_line_length.unwrap_or(usize::MAX);
        let mut searched = 0;
        loop {
            let window = self.pending.len().min(limit);
            if let Some(pos) = memchr::memchr(terminator, &self.pending[searched..window]) {
                return Ok(self.pending.drain(..=searched + pos).collect());
            }
            if window == limit {
                self.pending.drain(..limit);
                warn!("{}: no line terminator within {} bytes", self.name(), limit);
                return Err(PortError::LineTooLong(limit));
            }
            searched = window;

            let appended = match self.handle.bytes_to_read()? {
                0 => 0,
                _ => self.handle.read_until(terminator, &mut self.pending)?,
            };
            if appended == 0 {
                self.pause().await;
            }
        }
    }

    /// Wait until every written byte has been transmitted.
    ///
    /// Returns without suspending when the output queue is already empty.
    pub async fn flush(&mut self) -> Result<(), PortError> {
        self.ensure_open()?;

        while self.handle.bytes_to_write()? > 0 {
            self.pause().await;
        }
        Ok(())
    }

    /// Drain the output queue, then close the port.
    ///
    /// If draining fails the port stays open and the error is returned, so
    /// the port is never closed with untransmitted data. Closing a closed
    /// port does nothing.
    pub async fn close(&mut self) -> Result<(), PortError> {
        if !self.handle.is_open() {
            return Ok(());
        }

        self.flush().await?;
        self.handle.close()?;
        self.discard_pending();
        info!("Closed {}", self.name());
        Ok(())
    }

    /// Close the port immediately, discarding untransmitted output.
    pub fn abort(&mut self) -> Result<(), PortError> {
        if !self.handle.is_open() {
            return Ok(());
        }

        if let Err(e) = self.handle.clear_output() {
            debug!("{}: could not discard output before abort: {}", self.name(), e);
        }
        self.discard_pending();
        self.handle.close()?;
        warn!("Aborted {}", self.name());
        Ok(())
    }

    /// [`read`](Self::read) bounded by a deadline.
    ///
    /// Bytes received before the deadline stay staged for the next read.
    pub async fn read_timeout(
        &mut self,
        bytecount: usize,
        limit: Duration,
    ) -> Result<Vec<u8>, PortError> {
        with_deadline(limit, self.read(bytecount)).await
    }

    /// [`readline`](Self::readline) bounded by a deadline.
    ///
    /// A partial line received before the deadline stays staged.
    pub async fn readline_timeout(&mut self, limit: Duration) -> Result<Vec<u8>, PortError> {
        with_deadline(limit, self.readline()).await
    }

    /// [`flush`](Self::flush) bounded by a deadline.
    pub async fn flush_timeout(&mut self, limit: Duration) -> Result<(), PortError> {
        with_deadline(limit, self.flush()).await
    }

    async fn pause(&self) {
        self.scheduler.pause(self.settings.interval).await;
    }

    fn ensure_open(&self) -> Result<(), PortError> {
        if self.handle.is_open() {
            Ok(())
        } else {
            Err(PortError::NotOpen)
        }
    }

    /// Move up to `count` bytes from the driver into the staging buffer.
    fn pull(&mut self, count: usize) -> Result<usize, PortError> {
        let start = self.pending.len();
        self.pending.resize(start + count, 0);
        let result = self.handle.read_bytes(&mut self.pending[start..]);
        let got = *result.as_ref().unwrap_or(&0);
        self.pending.truncate(start + got);
        result
    }

    fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                "{}: dropping {} unread bytes",
                self.handle.name(),
                self.pending.len()
            );
            self.pending.clear();
        }
    }
}

async fn with_deadline<T>(
    limit: Duration,
    operation: impl Future<Output = Result<T, PortError>>,
) -> Result<T, PortError> {
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| PortError::timeout(limit))?
}

impl<H: SerialHandle> std::fmt::Debug for AsyncSerial<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSerial")
            .field("handle", &self.handle)
            .field("settings", &self.settings)
            .field("staged_bytes", &self.pending.len())
            .finish()
    }
}
