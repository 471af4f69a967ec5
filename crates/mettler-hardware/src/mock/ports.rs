//! Simulated serial ports.
//!
//! A simulated link blocks the calling thread the way a real port does: a
//! read with nothing to deliver waits for the link's read timeout and then
//! reports [`io::ErrorKind::TimedOut`].

use crate::error::TransportError;
use crate::transport::{PortConnector, SerialLink, SerialSettings};
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// How a simulated port behaves once opened.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PortBehavior {
    /// Opening fails.
    Unavailable,

    /// Opens, accepts writes, never answers.
    Silent,

    /// Opens and answers every transaction with these bytes.
    Replying(Vec<u8>),

    /// Opens, but every write fails.
    FailingWrite,

    /// Opens, but every read fails.
    FailingRead,
}

#[derive(Debug, Default)]
struct PortState {
    opened: AtomicUsize,
    released: AtomicUsize,
    peak_open: AtomicUsize,
    written: Mutex<Vec<u8>>,
}

/// Connector for simulated serial ports.
///
/// Clones share counters, so a test can keep one clone and hand the other to
/// a transport.
///
/// # Examples
///
/// ```
/// use mettler_core::BalanceConfig;
/// use mettler_hardware::mock::MockPorts;
/// use mettler_hardware::transport::SerialTransport;
///
/// let ports = MockPorts::replying(b"S   18.5 g\r\n");
/// let transport = SerialTransport::with_connector(&BalanceConfig::new("COM6"), ports.clone());
///
/// assert_eq!(transport.send_blocking("SI").unwrap(), "S   18.5 g");
/// assert_eq!(ports.written(), b"SI\r\n");
/// assert_eq!(ports.open_links(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockPorts {
    behavior: PortBehavior,
    reply_delay: Duration,
    state: Arc<PortState>,
}

impl MockPorts {
    fn with_behavior(behavior: PortBehavior) -> Self {
        Self {
            behavior,
            reply_delay: Duration::ZERO,
            state: Arc::new(PortState::default()),
        }
    }

    /// Ports that cannot be opened.
    pub fn unavailable() -> Self {
        Self::with_behavior(PortBehavior::Unavailable)
    }

    /// Ports that never answer.
    pub fn silent() -> Self {
        Self::with_behavior(PortBehavior::Silent)
    }

    /// Ports that answer every transaction with `reply`.
    pub fn replying(reply: impl AsRef<[u8]>) -> Self {
        Self::with_behavior(PortBehavior::Replying(reply.as_ref().to_vec()))
    }

    /// Ports whose writes fail.
    pub fn failing_write() -> Self {
        Self::with_behavior(PortBehavior::FailingWrite)
    }

    /// Ports whose reads fail.
    pub fn failing_read() -> Self {
        Self::with_behavior(PortBehavior::FailingRead)
    }

    /// Hold the reply back until `delay` after each open.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Number of successful opens.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed again.
    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn open_links(&self) -> usize {
        self.opened() - self.released()
    }

    /// Most connections that were ever open at the same time.
    pub fn max_open_links(&self) -> usize {
        self.state.peak_open.load(Ordering::SeqCst)
    }

    /// Every byte written across all connections.
    pub fn written(&self) -> Vec<u8> {
        self.state
            .written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PortConnector for MockPorts {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, TransportError> {
        if self.behavior == PortBehavior::Unavailable {
            return Err(TransportError::connection_failed(
                &settings.port,
                "no such device",
            ));
        }

        let opened = self.state.opened.fetch_add(1, Ordering::SeqCst) + 1;
        let live = opened - self.state.released.load(Ordering::SeqCst);
        self.state.peak_open.fetch_max(live, Ordering::SeqCst);

        let reply = match &self.behavior {
            PortBehavior::Replying(reply) => reply.clone(),
            _ => Vec::new(),
        };

        Ok(Box::new(MockLink {
            behavior: self.behavior.clone(),
            reply: Cursor::new(reply),
            ready_at: Instant::now() + self.reply_delay,
            read_timeout: settings.timeout,
            state: Arc::clone(&self.state),
        }))
    }
}

/// One open simulated connection.
struct MockLink {
    behavior: PortBehavior,
    reply: Cursor<Vec<u8>>,
    ready_at: Instant,
    read_timeout: Duration,
    state: Arc<PortState>,
}

impl MockLink {
    fn pending(&self) -> bool {
        self.reply.position() < self.reply.get_ref().len() as u64
    }

    fn idle_for(wait: Duration) -> io::Error {
        thread::sleep(wait);
        io::Error::new(io::ErrorKind::TimedOut, "operation timed out")
    }
}

impl Read for MockLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.behavior == PortBehavior::FailingRead {
            return Err(io::Error::other("device disconnected"));
        }

        // Real ports report an idle line as a timeout, not end of stream.
        if !self.pending() {
            return Err(Self::idle_for(self.read_timeout));
        }

        let wait = self.ready_at.saturating_duration_since(Instant::now());
        if wait > self.read_timeout {
            return Err(Self::idle_for(self.read_timeout));
        }
        thread::sleep(wait);

        self.reply.read(buf)
    }
}

impl SerialLink for MockLink {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }
}

impl Write for MockLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.behavior == PortBehavior::FailingWrite {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }

        self.state
            .written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}
