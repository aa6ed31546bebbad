use std::{fs, path::Path, path::PathBuf};

use directories::ProjectDirs;
use modkit_config::Role;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Config file not found")]
    NotFound,
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to the data directory
    #[serde(default)]
    pub file: bool,

    /// Filter used when RUST_LOG is not set (default: info)
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModkitConfig {
    /// Whether this process is the authoritative host or a remote
    #[serde(default)]
    pub role: Role,

    /// Directory holding settings files (default: <data dir>/settings)
    #[serde(default)]
    pub settings_dir: Option<PathBuf>,

    /// Length of one host tick in milliseconds (default: 100ms)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_tick_interval() -> u64 {
    100
}

impl Default for ModkitConfig {
    fn default() -> Self {
        Self {
            role: Role::Host,
            settings_dir: None,
            tick_interval_ms: default_tick_interval(),
            logging: LoggingConfig::default(),
        }
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# modkit configuration

# "host" persists settings and answers sync requests, "remote" asks for them
role = "host"

# settings_dir = "/path/to/settings"
tick_interval_ms = 100

[logging]
file = false
filter = "info"
"#;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "modkit")
}

impl ModkitConfig {
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".modkit/config.toml"))
    }

    /// Load from the default location
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::NotFound);
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self)?;
        fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the settings directory (use provided or default)
    pub fn settings_dir(&self) -> PathBuf {
        self.settings_dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join("settings"))
                .unwrap_or_else(|| PathBuf::from(".settings"))
        })
    }

    /// Settings file for the configuration called `name`
    pub fn settings_file(&self, name: &str) -> PathBuf {
        self.settings_dir().join(format!("{}.ini", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config: ModkitConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.role, Role::Host);
        assert_eq!(config.tick_interval_ms, 100);
        assert!(!config.logging.file);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ModkitConfig = toml::from_str("role = \"remote\"").unwrap();
        assert_eq!(config.role, Role::Remote);
        assert_eq!(config.tick_interval_ms, 100);
        assert!(config.settings_dir.is_none());
    }

    #[test]
    fn test_settings_file_uses_dir() {
        let config = ModkitConfig {
            settings_dir: Some(PathBuf::from("/tmp/mods")),
            ..ModkitConfig::default()
        };
        assert_eq!(config.settings_file("ZMU"), PathBuf::from("/tmp/mods/ZMU.ini"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ModkitConfig {
            role: Role::Remote,
            tick_interval_ms: 50,
            ..ModkitConfig::default()
        };

        config.save_to(&path).unwrap();
        let loaded = ModkitConfig::load_from(&path).unwrap();
        assert_eq!(loaded.role, Role::Remote);
        assert_eq!(loaded.tick_interval_ms, 50);
    }

    #[test]
    fn test_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(matches!(
            ModkitConfig::load_from(&path),
            Err(ConfigLoadError::NotFound)
        ));

        fs::write(&path, "role = 5").unwrap();
        assert!(matches!(
            ModkitConfig::load_from(&path),
            Err(ConfigLoadError::Parse(_))
        ));
    }
}
