//! Source registry.
//!
//! The registry maps logical names to sources, in configuration order. It is
//! built once from the configured balance list and performs no I/O: every
//! entry is validated and wired to a [`BalanceSession`], but no port is
//! opened until the first reading.
//!
//! Discovery is static. The balance protocol has no bus scan, so only
//! configured ports are ever registered.

use crate::balance::BalanceSession;
use crate::error::RegistryError;
use crate::transport::{SerialTransport, Transport};
use mettler_core::BalanceConfig;
use std::collections::HashMap;
use tracing::debug;

/// Ordered, uniquely named collection of sources.
#[derive(Debug)]
pub struct SourceRegistry<S = BalanceSession> {
    entries: Vec<(String, S)>,
    index: HashMap<String, usize>,
}

impl<S> SourceRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register `source` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if `name` is taken. The
    /// existing entry is left untouched.
    pub fn register(&mut self, name: impl Into<String>, source: S) -> Result<(), RegistryError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(RegistryError::duplicate_name(name));
        }

        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, source));
        Ok(())
    }

    /// Look up a source by name.
    pub fn get(&self, name: &str) -> Option<&S> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Whether a source is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Names and sources, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &S)> {
        self.entries
            .iter()
            .map(|(name, source)| (name.as_str(), source))
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> Default for SourceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Build a registry of serial balances.
    ///
    /// # Errors
    ///
    /// See [`build_with`](Self::build_with).
    pub fn build(configs: impl IntoIterator<Item = BalanceConfig>) -> Result<Self, RegistryError> {
        Self::build_with(configs, SerialTransport::new)
    }
}

impl<T: Transport> SourceRegistry<BalanceSession<T>> {
    /// Build a registry with transports produced by `factory`.
    ///
    /// Each entry is named by its label, or `"Mettler <port>"` without one.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidConfiguration`] if an entry fails validation
    /// - [`RegistryError::DuplicateName`] if two entries resolve to one name
    pub fn build_with<F>(
        configs: impl IntoIterator<Item = BalanceConfig>,
        mut factory: F,
    ) -> Result<Self, RegistryError>
    where
        F: FnMut(&BalanceConfig) -> T,
    {
        let mut registry = Self::new();

        for config in configs {
            let name = config.logical_name();

            config
                .validate()
                .map_err(|e| RegistryError::invalid_configuration(&name, e.to_string()))?;

            if registry.contains(&name) {
                return Err(RegistryError::duplicate_name(name));
            }

            debug!(name = %name, port = %config.port, "Registering balance");
            let transport = factory(&config);
            registry.register(name, BalanceSession::new(config, transport))?;
        }

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use rstest::rstest;

    fn mock(config: &BalanceConfig) -> MockTransport {
        MockTransport::always(&config.port, "S 1.0 g")
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = SourceRegistry::new();
        registry.register("a", 1).unwrap();
        registry.register("b", 2).unwrap();

        assert_eq!(registry.get("b"), Some(&2));
        assert_eq!(registry.get("c"), None);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_duplicate_keeps_first() {
        let mut registry = SourceRegistry::new();
        registry.register("a", 1).unwrap();

        assert_eq!(
            registry.register("a", 2),
            Err(RegistryError::duplicate_name("a"))
        );
        assert_eq!(registry.get("a"), Some(&1));
    }

    #[test]
    fn test_build_preserves_configuration_order() {
        let configs = vec![
            BalanceConfig::new("COM9"),
            BalanceConfig::new("COM1").with_name("bench"),
            BalanceConfig::new("COM5"),
        ];

        let registry = SourceRegistry::build_with(configs, mock).unwrap();

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["Mettler COM9", "bench", "Mettler COM5"]
        );
        assert_eq!(registry.get("bench").unwrap().port(), "COM1");
    }

    #[test]
    fn test_build_blank_label_falls_back_to_port() {
        let configs = vec![BalanceConfig::new("COM2").with_name("   ")];

        let registry = SourceRegistry::build_with(configs, mock).unwrap();

        assert!(registry.contains("Mettler COM2"));
    }

    #[test]
    fn test_build_rejects_duplicate_names() {
        let configs = vec![
            BalanceConfig::new("COM1").with_name("bench"),
            BalanceConfig::new("COM2").with_name("bench"),
        ];

        assert_eq!(
            SourceRegistry::build_with(configs, mock).unwrap_err(),
            RegistryError::duplicate_name("bench")
        );
    }

    #[test]
    fn test_build_rejects_label_colliding_with_port_name() {
        let configs = vec![
            BalanceConfig::new("COM1"),
            BalanceConfig::new("COM2").with_name("Mettler COM1"),
        ];

        assert!(matches!(
            SourceRegistry::build_with(configs, mock),
            Err(RegistryError::DuplicateName { .. })
        ));
    }

    #[rstest]
    #[case(BalanceConfig::new(""))]
    #[case(BalanceConfig::new("COM1").with_baud_rate(0))]
    #[case(BalanceConfig::new("COM1").with_byte_size(4))]
    #[case(BalanceConfig::new("COM1").with_byte_size(9))]
    #[case(BalanceConfig::new("COM1").with_density(0.0))]
    #[case(BalanceConfig::new("COM1").with_density(f64::NAN))]
    #[case(BalanceConfig::new("COM1").with_dry_weight(-1.0))]
    #[case(BalanceConfig::new("COM1").with_timeout(std::time::Duration::ZERO))]
    fn test_build_rejects_invalid_configuration(#[case] config: BalanceConfig) {
        assert!(matches!(
            SourceRegistry::build_with(vec![config], mock),
            Err(RegistryError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_build_performs_no_io() {
        let configs = vec![BalanceConfig::new("COM1")];
        let mut created = 0;

        let registry = SourceRegistry::build_with(configs, |config| {
            created += 1;
            let (transport, handle) = MockTransport::new(&config.port);
            assert!(handle.sent_commands().is_empty());
            transport
        })
        .unwrap();

        assert_eq!(created, 1);
        assert_eq!(registry.len(), 1);
    }
}
