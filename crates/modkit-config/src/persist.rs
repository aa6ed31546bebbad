//! Settings files.
//!
//! A settings file holds one `key = value` pair per line. Blank lines and
//! lines starting with `;` are skipped, there are no sections, and nothing is
//! escaped: the key ends at the first `=` and both sides are trimmed.
//!
//! Only settings that differ from their default, or that were read from the
//! file during the last load, are written back.

use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;

use crate::configuration::Configuration;
use crate::error::ConfigError;
use crate::notify::ConfigEventKind;
use crate::sync::Role;
use crate::value::{OptionKind, SettingValue};

/// A `key = value` line as found in a settings file, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// 1-based line number
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// Split settings file text into entries. Malformed lines are logged and
/// skipped.
pub fn parse_settings(text: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            warn!(target: "modkit::persist", "Skipping line {} without '=': {}", index + 1, line);
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            warn!(target: "modkit::persist", "Skipping line {} with empty key", index + 1);
            continue;
        }

        entries.push(RawEntry {
            line: index + 1,
            key: key.to_string(),
            value: value.trim().to_string(),
        });
    }

    entries
}

/// Render settings in file order
pub fn format_settings<'a>(
    settings: impl IntoIterator<Item = (&'a str, &'a SettingValue)>,
) -> String {
    let mut out = String::new();
    for (key, value) in settings {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

/// Convert file text into a value for an option of `kind`.
///
/// Booleans are only recognized as the exact lowercase literals. Text that
/// cannot be read as the option's type is passed through unchanged, so it
/// fails validation and the option falls back to its default.
pub fn parse_value(kind: OptionKind, raw: &str) -> SettingValue {
    match kind {
        OptionKind::Boolean => match raw {
            "true" => SettingValue::Boolean(true),
            "false" => SettingValue::Boolean(false),
            _ => SettingValue::Text(raw.to_string()),
        },
        OptionKind::Integer | OptionKind::Float => raw
            .parse::<i64>()
            .map(SettingValue::Integer)
            .or_else(|_| raw.parse::<f64>().map(SettingValue::Float))
            .unwrap_or_else(|_| SettingValue::Text(raw.to_string())),
        OptionKind::String => SettingValue::Text(raw.to_string()),
    }
}

pub fn read_entries(path: &Path) -> io::Result<Vec<RawEntry>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_settings(&text))
}

fn write_text(path: &Path, text: &str) -> io::Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)
}

impl Configuration {
    /// Settings that [`Configuration::save`] would write
    pub fn persisted_settings(&self) -> Vec<(&str, &SettingValue)> {
        self.settings
            .iter()
            .filter(|(key, value)| {
                self.options.get(key.as_str()).is_some_and(|schema| {
                    schema.was_loaded() || *value != schema.default_value()
                })
            })
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    /// Write changed settings to `path`.
    ///
    /// Only the host persists; on a remote this does nothing so values pushed
    /// by the host never end up in the remote's own file.
    pub fn save(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();

        if self.role != Role::Host {
            self.logger.debug(format_args!(
                "Not saving {} to {}: only the host persists settings",
                self.name,
                path.display()
            ));
            return false;
        }

        let settings = self.persisted_settings();
        let count = settings.len();
        let text = format_settings(settings);

        if let Err(source) = write_text(path, &text) {
            let err = ConfigError::FileUnavailable {
                path: path.to_path_buf(),
                source,
            };
            self.logger.error(format_args!("{}", err));
            return false;
        }

        self.logger.info(format_args!(
            "Saved {} setting(s) to {}",
            count,
            path.display()
        ));
        self.notify(ConfigEventKind::Saved {
            path: path.to_path_buf(),
        });
        true
    }

    /// Read settings from `path`.
    ///
    /// A missing file is not an error: nothing changes and `false` is
    /// returned. Unknown keys are logged and skipped; malformed values are
    /// corrected by validation.
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();

        let entries = match read_entries(path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.logger
                    .verbose(format_args!("No settings file at {}", path.display()));
                return false;
            }
            Err(source) => {
                let err = ConfigError::FileUnavailable {
                    path: path.to_path_buf(),
                    source,
                };
                self.logger.error(format_args!("{}", err));
                return false;
            }
        };

        for schema in self.options.values_mut() {
            schema.set_loaded(false);
        }

        let count = entries.len();
        for entry in entries {
            let Some(schema) = self.options.get_mut(&entry.key) else {
                let err = ConfigError::UnknownOption { key: entry.key };
                self.logger.warn(format_args!(
                    "{} ({}:{})",
                    err,
                    path.display(),
                    entry.line
                ));
                continue;
            };

            let value = parse_value(schema.kind(), &entry.value);
            schema.set_loaded(true);
            self.set(&entry.key, value);
        }

        self.logger.info(format_args!(
            "Loaded {} setting(s) from {}",
            count,
            path.display()
        ));
        self.notify(ConfigEventKind::Loaded {
            path: path.to_path_buf(),
        });
        true
    }
}
