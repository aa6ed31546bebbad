use std::collections::BTreeMap;

use modkit_logger::{LogLevel, Logger};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::ConfigError;
use crate::notify::{ConfigEvent, ConfigEventKind, Notifier, Subscriber};
use crate::schema::{OptionDecl, OptionSchema};
use crate::sync::{Role, SyncState};
use crate::validate::validate;
use crate::value::{SettingValue, Settings};

/// Option every configuration declares at creation. Its value drives the
/// level of the configuration's logger.
pub const LOG_LEVEL_KEY: &str = "LogLevel";

/// A named set of typed, validated settings
///
/// `options` and `settings` always hold the same keys: the only way to add a
/// setting is to declare its option with [`Configuration::add`].
#[derive(Debug)]
pub struct Configuration {
    pub(crate) name: String,
    pub(crate) role: Role,
    pub(crate) options: BTreeMap<String, OptionSchema>,
    pub(crate) settings: Settings,
    /// Settings in effect before the first temporary apply
    pub(crate) temporary: Option<Settings>,
    pub(crate) sync_state: SyncState,
    pub(crate) logger: Logger,
    pub(crate) notifier: Notifier,
}

impl Configuration {
    pub(crate) fn new(name: String, role: Role, logger: Logger) -> Self {
        let mut config = Self {
            name,
            role,
            options: BTreeMap::new(),
            settings: Settings::new(),
            temporary: None,
            sync_state: SyncState::default(),
            logger,
            notifier: Notifier::new(),
        };

        config.add(
            LOG_LEVEL_KEY,
            OptionSchema::integer(LogLevel::default().as_setting()).with_range(
                LogLevel::MIN.as_setting() as f64,
                LogLevel::MAX.as_setting() as f64,
            ),
        );
        config.sync_log_level();
        config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    /// Declare an option. Re-declaring a key is logged and ignored.
    pub fn add(&mut self, key: &str, schema: OptionSchema) -> bool {
        if self.options.contains_key(key) {
            let err = ConfigError::DuplicateOption {
                key: key.to_string(),
            };
            self.logger.error(format_args!("{}", err));
            return false;
        }

        self.logger.verbose(format_args!(
            "Declared {} option {} (default {})",
            schema.kind(),
            key,
            schema.default_value()
        ));
        self.settings
            .insert(key.to_string(), schema.default_value().clone());
        self.options.insert(key.to_string(), schema);
        true
    }

    /// Declare an option from a loosely typed declaration. An invalid
    /// declaration is logged and nothing is registered.
    pub fn declare(&mut self, key: &str, decl: &OptionDecl) -> bool {
        match decl.to_schema(key) {
            Ok(schema) => self.add(key, schema),
            Err(err) => {
                self.logger.error(format_args!("{}", err));
                false
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        let value = self.settings.get(key);
        if value.is_none() {
            let err = ConfigError::UnknownOption {
                key: key.to_string(),
            };
            self.logger.warn(format_args!("{}", err));
        }
        value
    }

    /// Validate and commit a value.
    ///
    /// Returns whether the stored value changed. A value that validates to
    /// the current one is not an error; nothing is committed or notified.
    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> bool {
        let validated = match validate(key, self.options.get(key), value.into()) {
            Ok(validated) => validated,
            Err(err) => {
                self.logger.warn(format_args!("{}", err));
                return false;
            }
        };

        for issue in &validated.issues {
            self.logger.error(format_args!("{}", issue));
        }
        if validated.floored {
            self.logger.debug(format_args!(
                "Floored {} to {}",
                key, validated.value
            ));
        }

        if self.settings.get(key) == Some(&validated.value) {
            return false;
        }

        self.settings
            .insert(key.to_string(), validated.value.clone());
        if key == LOG_LEVEL_KEY {
            self.sync_log_level();
        }

        self.logger
            .debug(format_args!("Set {} = {}", key, validated.value));
        self.notify(ConfigEventKind::Changed {
            key: key.to_string(),
            value: validated.value,
        });
        true
    }

    /// Put every setting back to its default
    pub fn reset(&mut self) {
        for (key, schema) in &self.options {
            self.settings
                .insert(key.clone(), schema.default_value().clone());
        }
        self.sync_log_level();

        self.logger.debug(format_args!("Reset {}", self.name));
        self.notify(ConfigEventKind::Reset);
    }

    pub fn default(&self, key: &str) -> Option<&SettingValue> {
        self.options.get(key).map(OptionSchema::default_value)
    }

    pub fn schema(&self, key: &str) -> Option<&OptionSchema> {
        self.options.get(key)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Set every value in `settings`, returning how many changed
    pub fn apply(&mut self, settings: &Settings) -> usize {
        let mut changed = 0;
        for (key, value) in settings {
            if self.set(key, value.clone()) {
                changed += 1;
            }
        }
        changed
    }

    /// Apply `settings` on top of the current ones, keeping what was in
    /// effect before so [`Configuration::remove_temporary`] can restore it.
    ///
    /// Only the first temporary apply takes a snapshot; later ones replace
    /// values but restore to the same point.
    pub fn apply_temporary(&mut self, settings: &Settings) -> usize {
        if self.temporary.is_none() {
            self.temporary = Some(self.settings.clone());
        }
        self.apply(settings)
    }

    /// Restore the settings saved by the first [`Configuration::apply_temporary`]
    pub fn remove_temporary(&mut self) -> bool {
        let Some(snapshot) = self.temporary.take() else {
            return false;
        };
        self.apply(&snapshot);
        true
    }

    pub fn has_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.notifier.subscribe(subscriber);
    }

    pub fn subscribe_channel(&mut self) -> UnboundedReceiver<ConfigEvent> {
        self.notifier.subscribe_channel()
    }

    pub(crate) fn notify(&mut self, kind: ConfigEventKind) {
        self.notifier.notify(ConfigEvent {
            config: self.name.clone(),
            kind,
        });
    }

    fn sync_log_level(&self) {
        if let Some(level) = self.settings.get(LOG_LEVEL_KEY).and_then(SettingValue::as_i64) {
            self.logger.set_level(LogLevel::from_setting(level));
        }
    }
}
