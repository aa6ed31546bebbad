//! Coercion of raw values against an option schema.
//!
//! Validation never rejects a value outright. A value of the wrong type is
//! replaced by the schema default, a fractional integer is floored and a
//! number outside the declared bounds is clamped. Text containing a line
//! break cannot be stored in a settings file and is replaced by the default
//! as well. The caller gets the value to commit plus a list of what was
//! corrected, which it logs.

use std::ops::Range;

use crate::error::ConfigError;
use crate::schema::OptionSchema;
use crate::value::{OptionKind, SettingValue};

/// Floats that convert to `i64` without saturating
const I64_RANGE: Range<f64> = (i64::MIN as f64)..(i64::MAX as f64);

/// Outcome of validating one value
#[derive(Debug)]
pub struct Validated {
    /// Value to commit. Always of the schema's type and within its bounds.
    pub value: SettingValue,
    /// Type mismatches and clamping applied on the way
    pub issues: Vec<ConfigError>,
    /// The input was a fractional number for an integer option
    pub floored: bool,
}

/// Validate `raw` for the option `key`.
///
/// Fails only when there is no schema, i.e. the option was never declared.
pub fn validate(
    key: &str,
    schema: Option<&OptionSchema>,
    raw: SettingValue,
) -> Result<Validated, ConfigError> {
    let schema = schema.ok_or_else(|| ConfigError::UnknownOption {
        key: key.to_string(),
    })?;

    let mut issues = Vec::new();
    let mut floored = false;

    let value = match (schema.kind(), raw) {
        (OptionKind::Integer, SettingValue::Integer(v)) => {
            SettingValue::Integer(clamp_integer(key, schema, v, &mut issues))
        }
        (OptionKind::Integer, SettingValue::Float(v)) if v.is_finite() => {
            let whole = v.floor();
            floored = whole != v;

            let reported = issues.len();
            let value = clamp_integer(key, schema, whole as i64, &mut issues);
            // `as` saturates; report it unless the declared bounds already did
            if !I64_RANGE.contains(&whole) && issues.len() == reported {
                issues.push(ConfigError::OutOfRange {
                    key: key.to_string(),
                    value: whole,
                    clamped: SettingValue::Integer(value),
                });
            }
            SettingValue::Integer(value)
        }
        (OptionKind::Float, SettingValue::Integer(v)) => {
            SettingValue::Float(clamp_float(key, schema, v as f64, &mut issues))
        }
        (OptionKind::Float, SettingValue::Float(v)) if !v.is_nan() => {
            SettingValue::Float(clamp_float(key, schema, v, &mut issues))
        }
        (OptionKind::Boolean, value @ SettingValue::Boolean(_)) => value,
        (OptionKind::String, SettingValue::Text(text)) if text.contains(['\n', '\r']) => {
            issues.push(ConfigError::LineBreak {
                key: key.to_string(),
            });
            schema.default_value().clone()
        }
        (OptionKind::String, value @ SettingValue::Text(_)) => value,
        (kind, other) => {
            issues.push(ConfigError::InvalidType {
                key: key.to_string(),
                expected: kind,
                found: type_label(&other),
            });
            schema.default_value().clone()
        }
    };

    Ok(Validated {
        value,
        issues,
        floored,
    })
}

fn type_label(value: &SettingValue) -> &'static str {
    match value {
        SettingValue::Float(v) if v.is_nan() => "NaN",
        SettingValue::Float(v) if v.is_infinite() => "infinity",
        other => other.type_name(),
    }
}

/// Bounds are tightened to whole numbers so the result stays integral
fn clamp_integer(
    key: &str,
    schema: &OptionSchema,
    value: i64,
    issues: &mut Vec<ConfigError>,
) -> i64 {
    let mut clamped = value;
    if let Some(min) = schema.min().map(f64::ceil) {
        if (clamped as f64) < min {
            clamped = min as i64;
        }
    }
    if let Some(max) = schema.max().map(f64::floor) {
        if (clamped as f64) > max {
            clamped = max as i64;
        }
    }

    if clamped != value {
        issues.push(ConfigError::OutOfRange {
            key: key.to_string(),
            value: value as f64,
            clamped: SettingValue::Integer(clamped),
        });
    }
    clamped
}

fn clamp_float(key: &str, schema: &OptionSchema, value: f64, issues: &mut Vec<ConfigError>) -> f64 {
    let mut clamped = value;
    if let Some(min) = schema.min() {
        if clamped < min {
            clamped = min;
        }
    }
    if let Some(max) = schema.max() {
        if clamped > max {
            clamped = max;
        }
    }

    if clamped != value {
        issues.push(ConfigError::OutOfRange {
            key: key.to_string(),
            value,
            clamped: SettingValue::Float(clamped),
        });
    }
    clamped
}
