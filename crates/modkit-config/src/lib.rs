//! Typed mod settings for modkit
//!
//! A [`ConfigRegistry`] owns named [`Configuration`]s. Each configuration
//! declares typed options, validates every value before committing it,
//! persists the settings that differ from their defaults to a plain
//! `key = value` file, and can pull the host's settings when running as a
//! remote.
//!
//! ```
//! use modkit_config::{ConfigRegistry, OptionSchema, Role, SettingValue};
//!
//! let mut registry = ConfigRegistry::new(Role::Host);
//! let config = registry.create("ZMU", None);
//! config.add("IntTest", OptionSchema::integer(50).with_range(0.0, 100.0));
//!
//! assert!(config.set("IntTest", 101));
//! assert_eq!(config.get("IntTest"), Some(&SettingValue::Integer(100)));
//! ```

pub mod configuration;
pub mod error;
pub mod notify;
pub mod persist;
pub mod registry;
pub mod schema;
pub mod sync;
pub mod transport;
pub mod validate;
pub mod value;

pub use configuration::{Configuration, LOG_LEVEL_KEY};
pub use error::ConfigError;
pub use notify::{ConfigEvent, ConfigEventKind, Notifier, Subscriber};
pub use persist::{format_settings, parse_settings, parse_value, RawEntry};
pub use registry::ConfigRegistry;
pub use schema::{OptionDecl, OptionSchema};
pub use sync::{
    schedule_initial_sync, Envelope, PeerId, Role, SyncCommand, SyncEndpoint, SyncState,
    Transport, UnknownCommand,
};
pub use transport::{link, ChannelTransport, Delivery, Endpoint, HOST_PEER};
pub use validate::{validate, Validated};
pub use value::{OptionKind, SettingValue, Settings};
