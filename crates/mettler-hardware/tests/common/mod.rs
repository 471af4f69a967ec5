//! Shared fixtures for hardware integration tests.

#![allow(dead_code)]

use mettler_core::BalanceConfig;
use mettler_hardware::mock::MockPorts;
use mettler_hardware::transport::SerialTransport;
use std::collections::HashMap;
use std::time::Duration;

/// Short read timeout so silent ports fail fast.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for a test balance on `port`.
pub fn balance(port: &str) -> BalanceConfig {
    BalanceConfig::new(port).with_timeout(TEST_TIMEOUT)
}

/// Simulated ports keyed by port name.
///
/// Ports without an entry behave as unavailable.
#[derive(Debug, Default, Clone)]
pub struct Bench {
    ports: HashMap<String, MockPorts>,
}

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: &str, ports: MockPorts) -> Self {
        self.ports.insert(port.to_string(), ports);
        self
    }

    pub fn port(&self, port: &str) -> MockPorts {
        self.ports
            .get(port)
            .cloned()
            .unwrap_or_else(MockPorts::unavailable)
    }

    /// Transport factory for `SourceRegistry::build_with`.
    pub fn transport(&self, config: &BalanceConfig) -> SerialTransport<MockPorts> {
        SerialTransport::with_connector(config, self.port(&config.port))
    }

    /// Connections still open across all ports.
    pub fn open_links(&self) -> usize {
        self.ports.values().map(MockPorts::open_links).sum()
    }
}
