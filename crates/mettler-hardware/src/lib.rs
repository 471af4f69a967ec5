//! Serial driver for Mettler-Toledo AG balances.
//!
//! This crate turns configured balance ports into named weight sources and
//! exposes them to a host through a small controller API.
//!
//! # Layers
//!
//! ```text
//! PluginController ──► SourceRegistry ──► BalanceSession ──► Transport
//!   list/read/read_all    name → session     read/identify      send line
//! ```
//!
//! - [`transport`]: one request/response transaction per call over a serial
//!   port that is opened and released around it.
//! - [`balance`]: parses responses into grams and maps failures to
//!   [`ReadError`] values.
//! - [`registry`]: validates configuration and names each balance.
//! - [`controller`]: the host-facing API.
//!
//! # Design Philosophy
//!
//! - **Async-first**: all transactions are `async`; blocking serial I/O runs
//!   on Tokio's blocking pool.
//! - **Isolated failures**: a balance that cannot be reached yields an error
//!   value for its own reading and never stops the others.
//! - **No fabricated readings**: a failed reading is an `Err`, never zero.
//!
//! # Example
//!
//! ```no_run
//! use mettler_core::PluginConfig;
//! use mettler_hardware::PluginController;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PluginConfig::load("mettler.toml")?;
//!     let controller = PluginController::from_config(&config)?;
//!
//!     for (name, reading) in controller.read_all().await {
//!         match reading {
//!             Ok(grams) => println!("{name}: {grams} g"),
//!             Err(e) => eprintln!("{name}: {e}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod balance;
pub mod controller;
pub mod error;
pub mod mock;
pub mod registry;
pub mod traits;
pub mod transport;
pub mod types;

pub use balance::BalanceSession;
pub use controller::PluginController;
pub use error::{ReadError, RegistryError, Result, TransportError};
pub use registry::SourceRegistry;
pub use traits::WeightSource;
pub use transport::{PortConnector, SerialSettings, SerialTransport, SystemPorts, Transport};
pub use types::BalanceInfo;
