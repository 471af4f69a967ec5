//! Serial transport for request/response transactions.
//!
//! Every transaction opens the port, writes one command line, reads one
//! response line and closes the port again:
//!
//! ```text
//! open ──► write "SI\r\n" ──► read until "\n" or timeout ──► close
//! ```
//!
//! The port is owned by a local [`SerialLink`] box for the duration of
//! [`SerialTransport::send_blocking`], so it is released on every exit path:
//! success, timeout, write failure or read failure.
//!
//! # Blocking I/O
//!
//! Serial ports are blocking handles. The async [`Transport::send`] runs the
//! transaction on Tokio's blocking pool so a slow balance never stalls the
//! runtime's worker threads.
//!
//! A transport and its clones share one port lock, taken on the blocking
//! thread for the whole transaction. Dropping the future returned by
//! [`Transport::send`] does not stop a transaction already running, so the
//! next one waits for it to release the port.
//!
//! # Read deadline
//!
//! The timeout bounds the whole response line, not each read. Before every
//! read the link's own timeout is lowered to the time left until the
//! deadline.
//!
//! # Partial lines
//!
//! If the timeout fires after some bytes arrived but before the terminator,
//! the bytes received so far are returned as the response and left for the
//! parser to accept or reject. A timeout with no bytes at all is a
//! [`TransportError::Timeout`].

use crate::error::TransportError;
use bytes::BytesMut;
use mettler_core::{BalanceConfig, Parity};
use mettler_protocol::LineCodec;
use serialport::{DataBits, FlowControl, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace, warn};

/// Size of a single read from the port.
const READ_CHUNK_SIZE: usize = 64;

/// Line settings for one balance port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Port identifier (`COM6`, `/dev/ttyUSB0`).
    pub port: String,

    /// Baud rate.
    pub baud_rate: u32,

    /// Data bits per character (5 to 8).
    pub byte_size: u8,

    /// Parity mode.
    pub parity: Parity,

    /// Software (XON/XOFF) flow control.
    pub flow_control: bool,

    /// Read timeout for one response line.
    pub timeout: Duration,
}

impl From<&BalanceConfig> for SerialSettings {
    fn from(config: &BalanceConfig) -> Self {
        Self {
            port: config.port.clone(),
            baud_rate: config.baud_rate,
            byte_size: config.byte_size,
            parity: config.parity,
            flow_control: config.flow_control,
            timeout: config.timeout(),
        }
    }
}

impl SerialSettings {
    /// Timeout in whole milliseconds, as reported in errors.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// An open, bidirectional serial connection.
pub trait SerialLink: Read + Write + Send {
    /// Limit how long the next read may block.
    ///
    /// # Errors
    ///
    /// Returns the port's error if the timeout cannot be applied.
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.as_mut().set_timeout(timeout).map_err(io::Error::from)
    }
}

/// Opens serial connections.
///
/// The production implementation is [`SystemPorts`]; tests substitute an
/// in-memory connector.
pub trait PortConnector: Send + Sync + 'static {
    /// Open a connection with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionFailed`] if the port is missing,
    /// busy or cannot be configured.
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, TransportError>;
}

/// Connector for the operating system's serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl SystemPorts {
    fn data_bits(settings: &SerialSettings) -> Result<DataBits, TransportError> {
        match settings.byte_size {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(TransportError::connection_failed(
                &settings.port,
                format!("unsupported byte size {other}"),
            )),
        }
    }

    fn parity(parity: Parity) -> serialport::Parity {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

impl PortConnector for SystemPorts {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, TransportError> {
        let flow_control = if settings.flow_control {
            FlowControl::Software
        } else {
            FlowControl::None
        };

        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .data_bits(Self::data_bits(settings)?)
            .parity(Self::parity(settings.parity))
            .stop_bits(StopBits::One)
            .flow_control(flow_control)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| TransportError::connection_failed(&settings.port, e.to_string()))?;

        Ok(Box::new(port))
    }
}

/// A request/response channel to one balance.
pub trait Transport: Send + Sync {
    /// Port this transport talks to.
    fn port(&self) -> &str;

    /// Send one command and wait for one response line.
    ///
    /// The returned line has its terminator stripped.
    fn send(&self, command: &str)
    -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Serial transport that opens a fresh connection per transaction.
#[derive(Debug)]
pub struct SerialTransport<C = SystemPorts> {
    settings: SerialSettings,
    connector: Arc<C>,
    port_lock: Arc<Mutex<()>>,
}

impl<C> Clone for SerialTransport<C> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            connector: Arc::clone(&self.connector),
            port_lock: Arc::clone(&self.port_lock),
        }
    }
}

impl SerialTransport {
    /// Create a transport for the operating system port named in `config`.
    pub fn new(config: &BalanceConfig) -> Self {
        Self::with_connector(config, SystemPorts)
    }
}

impl<C: PortConnector> SerialTransport<C> {
    /// Create a transport that opens connections through `connector`.
    pub fn with_connector(config: &BalanceConfig, connector: C) -> Self {
        Self {
            settings: SerialSettings::from(config),
            connector: Arc::new(connector),
            port_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Line settings used for every connection.
    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    /// Run one transaction on the calling thread.
    ///
    /// Blocks while another transaction on this transport, or on a clone of
    /// it, holds the port.
    ///
    /// # Errors
    ///
    /// - [`TransportError::ConnectionFailed`] if the port cannot be opened
    /// - [`TransportError::IoFault`] if writing or reading fails
    /// - [`TransportError::Timeout`] if no byte arrives before the timeout
    pub fn send_blocking(&self, command: &str) -> Result<String, TransportError> {
        let port = self.settings.port.as_str();
        let mut codec = LineCodec::new();

        let mut request = BytesMut::new();
        codec
            .encode(command, &mut request)
            .map_err(|e| TransportError::io_fault(port, e.to_string()))?;

        let _exclusive = self.port_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut link = self.connector.open(&self.settings)?;
        debug!(port, command, "Sending command");

        link.write_all(&request)
            .and_then(|()| link.flush())
            .map_err(|e| TransportError::io_fault(port, e.to_string()))?;

        let line = self.read_line(link.as_mut(), &mut codec)?;
        debug!(port, response = %line, "Received response");

        Ok(line)
    }

    fn read_line(
        &self,
        link: &mut dyn SerialLink,
        codec: &mut LineCodec,
    ) -> Result<String, TransportError> {
        let port = self.settings.port.as_str();
        let fault = |e: io::Error| TransportError::io_fault(port, e.to_string());

        let deadline = Instant::now() + self.settings.timeout;
        let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(line) = codec.decode(&mut buffer).map_err(fault)? {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            link.set_read_timeout(remaining).map_err(fault)?;

            match link.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    trace!(port, bytes = n, "Read chunk");
                    buffer.extend_from_slice(&chunk[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                    ) =>
                {
                    break;
                }
                Err(e) => return Err(fault(e)),
            }
        }

        match codec.decode_eof(&mut buffer).map_err(fault)? {
            Some(partial) => {
                warn!(port, response = %partial, "Timed out before line terminator");
                Ok(partial)
            }
            None => Err(TransportError::timeout(port, self.settings.timeout_ms())),
        }
    }
}

impl<C: PortConnector> Transport for SerialTransport<C> {
    fn port(&self) -> &str {
        &self.settings.port
    }

    async fn send(&self, command: &str) -> Result<String, TransportError> {
        let transport = self.clone();
        let command = command.to_string();

        tokio::task::spawn_blocking(move || transport.send_blocking(&command))
            .await
            .map_err(|e| {
                TransportError::io_fault(&self.settings.port, format!("transaction aborted: {e}"))
            })?
    }
}
