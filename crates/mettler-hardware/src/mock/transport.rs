//! Scripted transport.

use crate::error::TransportError;
use crate::transport::Transport;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<Result<String, TransportError>>,
    fallback: Option<Result<String, TransportError>>,
    sent: Vec<String>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<Script>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Shared {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Transport that answers from a script instead of a serial port.
///
/// Queued responses are consumed in order; once the queue is empty every
/// transaction gets the fallback response, or a timeout if none is set.
///
/// # Examples
///
/// ```
/// use mettler_hardware::mock::MockTransport;
/// use mettler_hardware::transport::Transport;
///
/// #[tokio::main]
/// async fn main() {
///     let (transport, handle) = MockTransport::new("COM6");
///     handle.push_response("S   18.5 g");
///
///     assert_eq!(transport.send("SI").await.unwrap(), "S   18.5 g");
///     assert_eq!(handle.sent_commands(), vec!["SI".to_string()]);
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    port: String,
    shared: Arc<Shared>,
}

/// Handle for scripting a [`MockTransport`] and inspecting what it was sent.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    port: String,
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a mock transport for `port` with an empty script.
    pub fn new(port: impl Into<String>) -> (Self, MockTransportHandle) {
        let port = port.into();
        let shared = Arc::new(Shared::default());

        let transport = Self {
            port: port.clone(),
            shared: Arc::clone(&shared),
        };
        let handle = MockTransportHandle { port, shared };

        (transport, handle)
    }

    /// Mock transport that answers every command with `line`.
    pub fn always(port: impl Into<String>, line: impl Into<String>) -> Self {
        let (transport, handle) = Self::new(port);
        handle.set_fallback(Ok(line.into()));
        transport
    }

    /// Mock transport that fails every command with `error`.
    pub fn failing(port: impl Into<String>, error: TransportError) -> Self {
        let (transport, handle) = Self::new(port);
        handle.set_fallback(Err(error));
        transport
    }
}

impl MockTransportHandle {
    /// Port of the transport this handle scripts.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Queue a response line.
    pub fn push_response(&self, line: impl Into<String>) {
        self.shared.script().queued.push_back(Ok(line.into()));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.shared.script().queued.push_back(Err(error));
    }

    /// Set the answer used once the queue is exhausted.
    pub fn set_fallback(&self, response: Result<String, TransportError>) {
        self.shared.script().fallback = Some(response);
    }

    /// Delay every transaction by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.shared.script().delay = Some(delay);
    }

    /// Commands sent so far, oldest first.
    pub fn sent_commands(&self) -> Vec<String> {
        self.shared.script().sent.clone()
    }

    /// Highest number of transactions that were in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn port(&self) -> &str {
        &self.port
    }

    async fn send(&self, command: &str) -> Result<String, TransportError> {
        let in_flight = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared
            .max_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);

        let (response, delay) = {
            let mut script = self.shared.script();
            script.sent.push(command.to_string());

            let response = script
                .queued
                .pop_front()
                .or_else(|| script.fallback.clone())
                .unwrap_or_else(|| Err(TransportError::timeout(&self.port, 0)));
            (response, script.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let (transport, handle) = MockTransport::new("COM1");
        handle.push_response("first");
        handle.set_fallback(Ok("again".to_string()));

        assert_eq!(transport.send("SI").await.unwrap(), "first");
        assert_eq!(transport.send("SI").await.unwrap(), "again");
        assert_eq!(transport.send("SI").await.unwrap(), "again");
    }

    #[tokio::test]
    async fn test_empty_script_times_out() {
        let (transport, handle) = MockTransport::new("COM1");

        let error = transport.send("I2").await.unwrap_err();

        assert!(matches!(error, TransportError::Timeout { .. }));
        assert_eq!(handle.sent_commands(), vec!["I2".to_string()]);
        assert_eq!(handle.port(), "COM1");
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = MockTransport::failing("COM2", TransportError::io_fault("COM2", "gone"));
        assert_eq!(
            transport.send("SI").await,
            Err(TransportError::io_fault("COM2", "gone"))
        );
    }
}
