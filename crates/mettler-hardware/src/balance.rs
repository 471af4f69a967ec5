//! Balance session.
//!
//! A [`BalanceSession`] binds one [`BalanceConfig`] to a [`Transport`] and
//! turns raw transactions into typed results:
//!
//! ```text
//! read("SI") ──► transport.send ──► ResponseParser::parse ──► grams
//!                     │                      │
//!                     ▼                      ▼
//!        ReadError::CommunicationFailed   ReadError::MalformedResponse
//! ```
//!
//! Nothing is held open between calls. Each call is one independent
//! transaction, and calls on the same session are serialized by an async
//! mutex. A call dropped mid-transaction releases that mutex early, so
//! [`SerialTransport`] also holds its own port lock until the serial work
//! has finished.
//!
//! All events are emitted inside the session's [`Span`], which defaults to a
//! `balance` span carrying the port and can be replaced with
//! [`BalanceSession::with_span`].

use crate::error::{ReadError, Result, TransportError};
use crate::traits::WeightSource;
use crate::transport::{SerialTransport, Transport};
use crate::types::BalanceInfo;
use chrono::{DateTime, Local};
use mettler_core::BalanceConfig;
use mettler_protocol::{Command, ParsedReading, ResponseParser, extract_quoted};
use tokio::sync::Mutex;
use tracing::{Instrument, Span, debug, error, info_span, warn};

/// One configured balance.
#[derive(Debug)]
pub struct BalanceSession<T = SerialTransport> {
    config: BalanceConfig,
    name: String,
    transport: Mutex<T>,
    span: Span,
    connected_at: DateTime<Local>,
}

impl BalanceSession {
    /// Create a session on the operating system port named in `config`.
    ///
    /// No connection is made until the first transaction.
    pub fn open(config: BalanceConfig) -> Self {
        let transport = SerialTransport::new(&config);
        Self::new(config, transport)
    }
}

impl<T: Transport> BalanceSession<T> {
    /// Create a session over `transport`.
    ///
    /// The session is always named `"Mettler <port>"`. A configured label
    /// only changes the name the balance is registered under.
    pub fn new(config: BalanceConfig, transport: T) -> Self {
        let name = config.session_name();
        let span = info_span!(
            "balance",
            name = %name,
            source = %config.logical_name(),
            port = %config.port
        );

        Self {
            config,
            name,
            transport: Mutex::new(transport),
            span,
            connected_at: Local::now(),
        }
    }

    /// Replace the span events are emitted in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Session name, `"Mettler <port>"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serial port of this balance.
    pub fn port(&self) -> &str {
        &self.config.port
    }

    /// Configuration the session was built from.
    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    /// Read the current weight in grams with the immediate-weight command.
    ///
    /// # Errors
    ///
    /// See [`read_reading`](Self::read_reading).
    pub async fn read(&self) -> Result<f64> {
        self.read_command(Command::WeightImmediate).await
    }

    /// Read the weight in grams with an arbitrary weight command.
    ///
    /// # Errors
    ///
    /// See [`read_reading`](Self::read_reading).
    pub async fn read_command(&self, command: impl Into<Command>) -> Result<f64> {
        self.read_reading(command).await.map(|reading| reading.grams())
    }

    /// Send `command` and parse the response, keeping the status code.
    ///
    /// # Errors
    ///
    /// - [`ReadError::CommunicationFailed`] if the transaction failed
    /// - [`ReadError::MalformedResponse`] if the response is not a weight
    pub async fn read_reading(&self, command: impl Into<Command>) -> Result<ParsedReading> {
        let command = command.into();

        let raw = match self.transact(&command).await {
            Ok(raw) => raw,
            Err(e) => {
                self.report_failure(&command, &e);
                return Err(ReadError::communication_failed(&self.name, e));
            }
        };

        self.span.in_scope(|| match ResponseParser::parse(&raw) {
            Ok(reading) => {
                debug!(
                    command = %command,
                    status = %reading.status,
                    value = reading.weight_value,
                    unit = %reading.unit,
                    grams = reading.grams(),
                    "Parsed reading"
                );
                Ok(reading)
            }
            Err(e) => {
                warn!(command = %command, response = ?raw, error = %e, "Malformed response");
                Err(ReadError::malformed_response(&self.name, e))
            }
        })
    }

    /// Query the model string (`I2`).
    ///
    /// Best effort: `None` if the balance does not answer with a quoted value.
    pub async fn identify_model(&self) -> Option<String> {
        self.identify(Command::ModelIdentity).await
    }

    /// Query the serial number (`I4`).
    ///
    /// Best effort: `None` if the balance does not answer with a quoted value.
    pub async fn identify_serial(&self) -> Option<String> {
        self.identify(Command::SerialIdentity).await
    }

    /// Describe this balance, querying its model and serial number.
    pub async fn info(&self) -> BalanceInfo {
        let model = self.identify_model().await;
        let serial_number = self.identify_serial().await;

        BalanceInfo {
            name: self.name.clone(),
            port: self.config.port.clone(),
            model,
            serial_number,
            dry_weight: self.config.dry_weight,
            density: self.config.density,
            connected_at: self.connected_at,
        }
    }

    async fn identify(&self, command: Command) -> Option<String> {
        match self.transact(&command).await {
            Ok(response) => {
                let value = extract_quoted(&response);
                if value.is_none() {
                    self.span.in_scope(|| {
                        warn!(command = %command, response = ?response, "Identity response has no quoted value");
                    });
                }
                value
            }
            Err(e) => {
                self.span.in_scope(|| {
                    warn!(command = %command, error = %e, "Identity query failed");
                });
                None
            }
        }
    }

    async fn transact(&self, command: &Command) -> std::result::Result<String, TransportError> {
        let transport = self.transport.lock().await;
        transport
            .send(command.as_str())
            .instrument(self.span.clone())
            .await
    }

    fn report_failure(&self, command: &Command, e: &TransportError) {
        let _entered = self.span.enter();
        if self.config.verbosity > 0 {
            error!(command = %command, error = %e, "Could not get Mettler data");
        } else {
            debug!(command = %command, error = %e, "Could not get Mettler data");
        }
    }
}

impl<T: Transport> WeightSource for BalanceSession<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<f64> {
        self.read_command(Command::WeightImmediate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use mettler_protocol::{ParseError, WeightUnit};
    use std::sync::Arc;
    use std::time::Duration;

    fn session() -> (BalanceSession<MockTransport>, crate::mock::MockTransportHandle) {
        let (transport, handle) = MockTransport::new("COM6");
        (BalanceSession::new(BalanceConfig::new("COM6"), transport), handle)
    }

    #[tokio::test]
    async fn test_read_returns_grams() {
        let (session, handle) = session();
        handle.push_response("S      18.5 g");

        assert_eq!(session.read().await, Ok(18.5));
        assert_eq!(handle.sent_commands(), vec!["SI".to_string()]);
    }

    #[tokio::test]
    async fn test_read_converts_units() {
        let (session, handle) = session();
        handle.push_response("S 18.5 kg");

        assert_eq!(session.read().await, Ok(18500.0));
    }

    #[tokio::test]
    async fn test_read_command_passes_token_through() {
        let (session, handle) = session();
        handle.push_response("S D 203.1 mg");

        let grams = session.read_command("S").await.unwrap();

        assert!((grams - 0.2031).abs() < 1e-12);
        assert_eq!(handle.sent_commands(), vec!["S".to_string()]);
    }

    #[tokio::test]
    async fn test_read_reading_keeps_status() {
        let (session, handle) = session();
        handle.push_response("S D 1.0 oz");

        let reading = session.read_reading(Command::WeightStable).await.unwrap();

        assert_eq!(reading.status, "S");
        assert_eq!(reading.unit, WeightUnit::Ounce);
        assert!(reading.is_stable());
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_read_error() {
        let transport = MockTransport::failing("COM6", TransportError::timeout("COM6", 5000));
        let session = BalanceSession::new(BalanceConfig::new("COM6").with_verbosity(0), transport);

        assert_eq!(
            session.read().await,
            Err(ReadError::communication_failed(
                "Mettler COM6",
                TransportError::timeout("COM6", 5000)
            ))
        );
    }

    #[tokio::test]
    async fn test_malformed_response_never_reads_as_zero() {
        let (session, handle) = session();
        handle.push_response("ES");

        assert_eq!(
            session.read().await,
            Err(ReadError::malformed_response(
                "Mettler COM6",
                ParseError::unexpected_format(1, "ES")
            ))
        );
    }

    #[tokio::test]
    async fn test_session_named_by_port_despite_label() {
        let (transport, handle) = MockTransport::new("COM4");
        let session = BalanceSession::new(BalanceConfig::new("COM4").with_name("bench"), transport);
        handle.set_fallback(Err(TransportError::timeout("COM4", 5000)));

        assert_eq!(session.name(), "Mettler COM4");
        assert_eq!(session.port(), "COM4");
        assert_eq!(session.config().logical_name(), "bench");
        assert_eq!(WeightSource::name(&session), "Mettler COM4");
        assert_eq!(session.info().await.name, "Mettler COM4");
    }

    #[tokio::test]
    async fn test_identify_extracts_quoted_values() {
        let (session, handle) = session();
        handle.push_response(r#"I2 A "AG204 Max 210g""#);
        handle.push_response(r#"I4 A "1113172519""#);

        assert_eq!(session.identify_model().await.as_deref(), Some("AG204 Max 210g"));
        assert_eq!(session.identify_serial().await.as_deref(), Some("1113172519"));
        assert_eq!(
            handle.sent_commands(),
            vec!["I2".to_string(), "I4".to_string()]
        );
    }

    #[tokio::test]
    async fn test_identify_degrades_to_none() {
        let (session, handle) = session();
        handle.push_response("I2 I");
        handle.push_error(TransportError::connection_failed("COM6", "busy"));

        assert_eq!(session.identify_model().await, None);
        assert_eq!(session.identify_serial().await, None);
    }

    #[tokio::test]
    async fn test_info_combines_identity_and_config() {
        let (transport, handle) = MockTransport::new("COM6");
        let config = BalanceConfig::new("COM6")
            .with_dry_weight(12.5)
            .with_density(1.0);
        let session = BalanceSession::new(config, transport);
        handle.push_response(r#"I2 A "AG204""#);
        handle.push_error(TransportError::timeout("COM6", 5000));

        let info = session.info().await;

        assert_eq!(info.name, "Mettler COM6");
        assert_eq!(info.port, "COM6");
        assert_eq!(info.model.as_deref(), Some("AG204"));
        assert_eq!(info.serial_number, None);
        assert_eq!(info.dry_weight, Some(12.5));
        assert_eq!(info.density, 1.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transactions_are_serialized() {
        let (transport, handle) = MockTransport::new("COM6");
        handle.set_fallback(Ok("S 1.0 g".to_string()));
        handle.set_delay(Duration::from_millis(10));
        let session = Arc::new(BalanceSession::new(BalanceConfig::new("COM6"), transport));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.read().await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(1.0));
        }
        assert_eq!(handle.max_in_flight(), 1);
        assert_eq!(handle.sent_commands().len(), 8);
    }
}
