use std::collections::BTreeMap;

use modkit_logger::{Logger, LoggerRegistry};
use tracing::debug;

use crate::configuration::Configuration;
use crate::sync::Role;

/// Owns every configuration in the process, keyed by unique name.
///
/// Configurations are never removed. Components that need to look a
/// configuration up by name take a reference to the registry.
#[derive(Debug)]
pub struct ConfigRegistry {
    pub(crate) role: Role,
    pub(crate) configs: BTreeMap<String, Configuration>,
    loggers: LoggerRegistry,
}

impl ConfigRegistry {
    pub fn new(role: Role) -> Self {
        Self::with_loggers(role, LoggerRegistry::new())
    }

    /// Use an existing logger registry, so configurations share loggers with
    /// the rest of the scripting environment
    pub fn with_loggers(role: Role, loggers: LoggerRegistry) -> Self {
        Self {
            role,
            configs: BTreeMap::new(),
            loggers,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Create a configuration.
    ///
    /// A name already in use gets the first free integer suffix: `name1`,
    /// `name2`, and so on. Without an explicit logger, the logger registered
    /// under the final name is used (and created if needed).
    pub fn create(&mut self, name: &str, logger: Option<Logger>) -> &mut Configuration {
        let unique = self.unique_name(name);
        if unique != name {
            debug!(target: "modkit::config", "Configuration {} exists, using {}", name, unique);
        }

        let logger = logger.unwrap_or_else(|| self.loggers.get_or_create(&unique));
        let config = Configuration::new(unique.clone(), self.role, logger);
        self.configs.entry(unique).or_insert(config)
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.configs.contains_key(name) {
            return name.to_string();
        }

        let mut counter = 1u64;
        loop {
            let candidate = format!("{}{}", name, counter);
            if !self.configs.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Configuration> {
        self.configs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Configuration> {
        self.configs.get_mut(name)
    }

    /// Every live configuration
    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.configs.values()
    }

    pub fn configurations_mut(&mut self) -> impl Iterator<Item = &mut Configuration> {
        self.configs.values_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn loggers(&self) -> &LoggerRegistry {
        &self.loggers
    }

    pub fn loggers_mut(&mut self) -> &mut LoggerRegistry {
        &mut self.loggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modkit_logger::LogLevel;

    #[test]
    fn test_name_collisions_get_suffixes() {
        let mut registry = ConfigRegistry::new(Role::Host);
        assert_eq!(registry.create("ZMU", None).name(), "ZMU");
        assert_eq!(registry.create("ZMU", None).name(), "ZMU1");
        assert_eq!(registry.create("ZMU", None).name(), "ZMU2");
        assert_eq!(registry.create("ZMU1", None).name(), "ZMU11");

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["ZMU", "ZMU1", "ZMU11", "ZMU2"]
        );
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_logger_looked_up_by_final_name() {
        let mut registry = ConfigRegistry::new(Role::Host);
        registry.create("Mod", None);
        registry.create("Mod", None);

        let first = registry.get("Mod").unwrap().logger().clone();
        let second = registry.get("Mod1").unwrap().logger().clone();
        assert!(!first.same_as(&second));
        assert!(first.same_as(&registry.loggers().get("Mod").unwrap()));
    }

    #[test]
    fn test_explicit_logger_is_used() {
        let mut registry = ConfigRegistry::new(Role::Remote);
        let logger = Logger::new("custom", LogLevel::Debug);
        let config = registry.create("Mod", Some(logger.clone()));

        assert!(config.logger().same_as(&logger));
        assert_eq!(config.role(), Role::Remote);
        // The configuration's LogLevel setting takes over the logger
        assert_eq!(logger.level(), LogLevel::Info);
        assert!(registry.loggers().get("Mod").is_none());
    }
}
