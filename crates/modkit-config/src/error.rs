use std::io;
use std::path::PathBuf;

use crate::value::{OptionKind, SettingValue};

/// Problems encountered while declaring, validating or persisting settings.
///
/// None of these escape the public [`crate::Configuration`] API. They are
/// logged through the configuration's logger and the operation falls back to
/// a safe value instead.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown option '{key}'")]
    UnknownOption { key: String },

    #[error("Option '{key}' is already declared")]
    DuplicateOption { key: String },

    #[error("Invalid type for '{key}': expected {expected}, got {found}")]
    InvalidType {
        key: String,
        expected: OptionKind,
        found: &'static str,
    },

    #[error("Value {value} for '{key}' is out of range, clamped to {clamped}")]
    OutOfRange {
        key: String,
        value: f64,
        clamped: SettingValue,
    },

    #[error("Value for '{key}' contains a line break")]
    LineBreak { key: String },

    #[error("Option '{key}' does not declare a type")]
    MissingSchemaType { key: String },

    #[error("Option '{key}' declares unsupported type '{kind}'")]
    UnsupportedType { key: String, kind: String },

    #[error("Settings file {} is unavailable: {source}", .path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
