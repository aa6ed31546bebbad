use serde::Deserialize;

use crate::error::ConfigError;
use crate::value::{OptionKind, SettingValue};

/// Declaration of a single option: its type, bounds and default.
///
/// The typed constructors guarantee that the default matches the kind.
/// Bounds are only consulted for numeric kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSchema {
    kind: OptionKind,
    min: Option<f64>,
    max: Option<f64>,
    default: SettingValue,
    /// Set when the current load pass read this option from a file, so the
    /// next save writes it back even if it equals the default
    was_loaded: bool,
}

impl OptionSchema {
    fn new(kind: OptionKind, default: SettingValue) -> Self {
        Self {
            kind,
            min: None,
            max: None,
            default,
            was_loaded: false,
        }
    }

    pub fn integer(default: i64) -> Self {
        Self::new(OptionKind::Integer, SettingValue::Integer(default))
    }

    pub fn float(default: f64) -> Self {
        Self::new(OptionKind::Float, SettingValue::Float(default))
    }

    pub fn boolean(default: bool) -> Self {
        Self::new(OptionKind::Boolean, SettingValue::Boolean(default))
    }

    pub fn string(default: impl Into<String>) -> Self {
        Self::new(OptionKind::String, SettingValue::Text(default.into()))
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_min(min).with_max(max)
    }

    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    pub fn min(&self) -> Option<f64> {
        self.min.filter(|_| self.kind.is_numeric())
    }

    pub fn max(&self) -> Option<f64> {
        self.max.filter(|_| self.kind.is_numeric())
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    pub fn was_loaded(&self) -> bool {
        self.was_loaded
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.was_loaded = loaded;
    }
}

/// Loosely typed option declaration, as read from a schema file.
///
/// ```toml
/// [options.IntTest]
/// type = "integer"
/// min = 0
/// max = 100
/// default = 50
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionDecl {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub default: Option<SettingValue>,
}

impl OptionDecl {
    /// Turn the declaration into a schema for `key`.
    ///
    /// A missing default falls back to the kind's zero value. A default of
    /// the wrong type is rejected; integral numbers are accepted for floats.
    pub fn to_schema(&self, key: &str) -> Result<OptionSchema, ConfigError> {
        let Some(name) = self.kind.as_deref() else {
            return Err(ConfigError::MissingSchemaType {
                key: key.to_string(),
            });
        };
        let kind = OptionKind::from_name(name).ok_or_else(|| ConfigError::UnsupportedType {
            key: key.to_string(),
            kind: name.to_string(),
        })?;

        let default = match (kind, self.default.clone()) {
            (kind, None) => kind.zero_value(),
            (OptionKind::Integer, Some(SettingValue::Integer(v))) => SettingValue::Integer(v),
            (OptionKind::Float, Some(SettingValue::Float(v))) => SettingValue::Float(v),
            (OptionKind::Float, Some(SettingValue::Integer(v))) => SettingValue::Float(v as f64),
            (OptionKind::Boolean, Some(SettingValue::Boolean(v))) => SettingValue::Boolean(v),
            (OptionKind::String, Some(SettingValue::Text(v))) if v.contains(['\n', '\r']) => {
                return Err(ConfigError::LineBreak {
                    key: key.to_string(),
                });
            }
            (OptionKind::String, Some(SettingValue::Text(v))) => SettingValue::Text(v),
            (kind, Some(other)) => {
                return Err(ConfigError::InvalidType {
                    key: key.to_string(),
                    expected: kind,
                    found: other.type_name(),
                });
            }
        };

        let mut schema = OptionSchema::new(kind, default);
        schema.min = self.min;
        schema.max = self.max;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(kind: Option<&str>, default: Option<SettingValue>) -> OptionDecl {
        OptionDecl {
            kind: kind.map(str::to_string),
            default,
            ..OptionDecl::default()
        }
    }

    #[test]
    fn test_bounds_ignored_for_non_numeric() {
        let schema = OptionSchema::boolean(true).with_range(0.0, 1.0);
        assert_eq!(schema.min(), None);
        assert_eq!(schema.max(), None);

        let schema = OptionSchema::integer(5).with_range(0.0, 10.0);
        assert_eq!(schema.min(), Some(0.0));
        assert_eq!(schema.max(), Some(10.0));
    }

    #[test]
    fn test_decl_missing_type() {
        let err = decl(None, Some(SettingValue::Integer(1)))
            .to_schema("Key")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSchemaType { .. }));
    }

    #[test]
    fn test_decl_unsupported_type() {
        let err = decl(Some("double"), None).to_schema("Key").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedType { ref kind, .. } if kind == "double"));
    }

    #[test]
    fn test_decl_default_type_mismatch() {
        let err = decl(Some("boolean"), Some(SettingValue::Integer(1)))
            .to_schema("Key")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidType {
                expected: OptionKind::Boolean,
                found: "integer",
                ..
            }
        ));
    }

    #[test]
    fn test_decl_float_accepts_integral_default() {
        let schema = decl(Some("float"), Some(SettingValue::Integer(2)))
            .to_schema("Key")
            .unwrap();
        assert_eq!(schema.default_value(), &SettingValue::Float(2.0));
    }

    #[test]
    fn test_decl_multiline_default_rejected() {
        let err = decl(Some("string"), Some(SettingValue::Text("a\nb".into())))
            .to_schema("Key")
            .unwrap_err();
        assert!(matches!(err, ConfigError::LineBreak { .. }));
    }

    #[test]
    fn test_decl_missing_default_uses_zero_value() {
        let schema = decl(Some("string"), None).to_schema("Key").unwrap();
        assert_eq!(schema.default_value(), &SettingValue::Text(String::new()));
        assert!(!schema.was_loaded());
    }
}
