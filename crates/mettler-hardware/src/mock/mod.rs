//! Mock transports for testing and development.
//!
//! Two levels are simulated:
//!
//! - [`MockPorts`] stands in for the operating system's serial ports, so the
//!   real [`SerialTransport`](crate::transport::SerialTransport) framing,
//!   timeout and release logic can run against scripted bytes.
//! - [`MockTransport`] replaces the whole transport with scripted response
//!   lines, for exercising sessions and the controller.

pub mod ports;
pub mod transport;

pub use ports::MockPorts;
pub use transport::{MockTransport, MockTransportHandle};
