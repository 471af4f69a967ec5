//! Plugin controller.
//!
//! The controller is the whole host-facing surface of the driver:
//! [`list_sources`](PluginController::list_sources),
//! [`read_source`](PluginController::read_source) and
//! [`read_all`](PluginController::read_all). It owns the registry and is
//! generic over [`WeightSource`], so it knows nothing about serial ports.
//!
//! # Examples
//!
//! ```
//! use mettler_core::BalanceConfig;
//! use mettler_hardware::controller::PluginController;
//! use mettler_hardware::mock::MockTransport;
//! use mettler_hardware::registry::SourceRegistry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = SourceRegistry::build_with(
//!         vec![BalanceConfig::new("COM6").with_name("bench")],
//!         |config| MockTransport::always(&config.port, "S   18.5 g"),
//!     )
//!     .unwrap();
//!     let controller = PluginController::new(registry);
//!
//!     assert_eq!(controller.list_sources(), vec!["bench".to_string()]);
//!     assert_eq!(controller.read_source("bench").await, Ok(18.5));
//! }
//! ```

use crate::balance::BalanceSession;
use crate::error::{ReadError, RegistryError, Result};
use crate::registry::SourceRegistry;
use crate::traits::WeightSource;
use crate::transport::Transport;
use crate::types::BalanceInfo;
use futures::future::join_all;
use mettler_core::PluginConfig;
use mettler_core::constants::{PLUGIN_DESCRIPTION, PLUGIN_NAME};
use tracing::{Instrument, Span, info, info_span};

/// Host-facing controller over a set of weight sources.
#[derive(Debug)]
pub struct PluginController<S = BalanceSession> {
    registry: SourceRegistry<S>,
    span: Span,
}

impl PluginController {
    /// Build a controller of serial balances from a plugin document.
    ///
    /// A disabled plugin yields a controller with no sources.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the source list is invalid.
    pub fn from_config(config: &PluginConfig) -> std::result::Result<Self, RegistryError> {
        let sources = if config.enabled {
            config.sources.clone()
        } else {
            Vec::new()
        };

        SourceRegistry::build(sources).map(Self::new)
    }
}

impl<T: Transport> PluginController<BalanceSession<T>> {
    /// Describe every balance, in registry order.
    pub async fn describe_all(&self) -> Vec<BalanceInfo> {
        let queries = self.registry.iter().map(|(_, session)| session.info());
        join_all(queries).instrument(self.span.clone()).await
    }
}

impl<S: WeightSource> PluginController<S> {
    /// Create a controller over `registry`.
    pub fn new(registry: SourceRegistry<S>) -> Self {
        let span = info_span!("plugin", name = PLUGIN_NAME);
        span.in_scope(|| {
            info!(count = registry.len(), "Connected {} Mettler Scale(s)", registry.len());
        });

        Self { registry, span }
    }

    /// Replace the span events are emitted in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Plugin identifier.
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Plugin description.
    pub fn description(&self) -> &'static str {
        PLUGIN_DESCRIPTION
    }

    /// Underlying registry.
    pub fn registry(&self) -> &SourceRegistry<S> {
        &self.registry
    }

    /// Logical names of all sources, in registry order.
    pub fn list_sources(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    /// Read one source by name.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::UnknownSource`] for an unregistered name, or the
    /// source's own error.
    pub async fn read_source(&self, name: &str) -> Result<f64> {
        let source = self
            .registry
            .get(name)
            .ok_or_else(|| ReadError::unknown_source(name))?;

        source.read().instrument(self.span.clone()).await
    }

    /// Read every source concurrently.
    ///
    /// Results come back in registry order, one per source; a failing source
    /// only affects its own entry.
    pub async fn read_all(&self) -> Vec<(String, Result<f64>)> {
        let reads = self.registry.iter().map(|(name, source)| async move {
            (name.to_string(), source.read().await)
        });

        join_all(reads).instrument(self.span.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::mock::MockTransport;
    use mettler_core::BalanceConfig;

    /// A source that answers without any transport.
    struct FixedSource {
        name: String,
        grams: f64,
    }

    impl WeightSource for FixedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn read(&self) -> Result<f64> {
            Ok(self.grams)
        }
    }

    fn controller() -> PluginController<BalanceSession<MockTransport>> {
        let configs = vec![
            BalanceConfig::new("COM1").with_name("left"),
            BalanceConfig::new("COM2").with_name("right"),
        ];
        let registry = SourceRegistry::build_with(configs, |config| match config.port.as_str() {
            "COM1" => MockTransport::always("COM1", "S   18.5 g"),
            _ => MockTransport::failing("COM2", TransportError::timeout("COM2", 5000)),
        })
        .unwrap();

        PluginController::new(registry)
    }

    #[test]
    fn test_identity() {
        let controller = controller();
        assert_eq!(controller.name(), "mettler-ag204");
        assert_eq!(
            controller.description(),
            "Gets weight data from Mettler-Toledo AG204 scale."
        );
    }

    #[test]
    fn test_list_sources_in_order() {
        assert_eq!(controller().list_sources(), vec!["left", "right"]);
    }

    #[tokio::test]
    async fn test_read_source() {
        let controller = controller();
        assert_eq!(controller.read_source("left").await, Ok(18.5));
        assert!(matches!(
            controller.read_source("right").await,
            Err(ReadError::CommunicationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_unknown_source() {
        assert_eq!(
            controller().read_source("middle").await,
            Err(ReadError::unknown_source("middle"))
        );
    }

    #[tokio::test]
    async fn test_read_all_isolates_failures() {
        let results = controller().read_all().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ("left".to_string(), Ok(18.5)));
        assert_eq!(results[1].0, "right");
        assert!(results[1].1.is_err());
    }

    #[tokio::test]
    async fn test_generic_over_weight_source() {
        let mut registry = SourceRegistry::new();
        registry
            .register("fixed", FixedSource { name: "fixed".to_string(), grams: 2.5 })
            .unwrap();
        let controller = PluginController::new(registry);

        assert_eq!(controller.read_all().await, vec![("fixed".to_string(), Ok(2.5))]);
        assert_eq!(controller.registry().get("fixed").map(|s| s.name()), Some("fixed"));
    }

    #[test]
    fn test_disabled_plugin_has_no_sources() {
        let config = PluginConfig {
            enabled: false,
            ..PluginConfig::default()
        };

        let controller = PluginController::from_config(&config).unwrap();

        assert!(controller.list_sources().is_empty());
    }

    #[test]
    fn test_from_config_default_document() {
        let controller = PluginController::from_config(&PluginConfig::default()).unwrap();
        assert_eq!(controller.list_sources(), vec!["Mettler COM6"]);
    }

    #[tokio::test]
    async fn test_describe_all() {
        let (transport, handle) = MockTransport::new("COM3");
        handle.push_response(r#"I2 A "AG204""#);
        handle.push_response(r#"I4 A "42""#);
        let mut registry = SourceRegistry::new();
        registry
            .register("Mettler COM3", BalanceSession::new(BalanceConfig::new("COM3"), transport))
            .unwrap();
        let controller = PluginController::new(registry);

        let infos = controller.describe_all().await;

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].model.as_deref(), Some("AG204"));
        assert_eq!(infos[0].serial_number.as_deref(), Some("42"));
    }
}
