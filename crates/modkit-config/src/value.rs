use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Current values of a configuration, keyed by option name
pub type Settings = BTreeMap<String, SettingValue>;

/// A setting value. The variant doubles as the value's type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl SettingValue {
    /// Name of the value's type as used in log messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Integer(_) => "integer",
            SettingValue::Float(_) => "float",
            SettingValue::Boolean(_) => "boolean",
            SettingValue::Text(_) => "string",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Integer(v) => Some(*v as f64),
            SettingValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Formats the value the way it is written to settings files
impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Integer(v) => write!(f, "{}", v),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::Boolean(v) => write!(f, "{}", v),
            SettingValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Integer(i64::from(value))
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Declared type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Integer,
    Float,
    Boolean,
    String,
}

impl OptionKind {
    /// Parse a declared type name. Only the four canonical names are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(OptionKind::Integer),
            "float" => Some(OptionKind::Float),
            "boolean" => Some(OptionKind::Boolean),
            "string" => Some(OptionKind::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OptionKind::Integer => "integer",
            OptionKind::Float => "float",
            OptionKind::Boolean => "boolean",
            OptionKind::String => "string",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, OptionKind::Integer | OptionKind::Float)
    }

    /// Value used when a declaration leaves out its default
    pub fn zero_value(self) -> SettingValue {
        match self {
            OptionKind::Integer => SettingValue::Integer(0),
            OptionKind::Float => SettingValue::Float(0.0),
            OptionKind::Boolean => SettingValue::Boolean(false),
            OptionKind::String => SettingValue::Text(String::new()),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
