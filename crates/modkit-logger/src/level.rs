use std::fmt;

/// Verbosity of a [`crate::Logger`]
///
/// The numeric values are what configurations store in their `LogLevel`
/// setting, so they must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    #[default]
    Info = 3,
    Debug = 4,
    Verbose = 5,
}

impl LogLevel {
    pub const MIN: LogLevel = LogLevel::Off;
    pub const MAX: LogLevel = LogLevel::Verbose;

    /// Convert a stored setting value, clamping anything out of range
    pub fn from_setting(value: i64) -> Self {
        match value {
            i64::MIN..=0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Verbose,
        }
    }

    pub fn as_setting(self) -> i64 {
        self as i64
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        Self::from_setting(i64::from(value))
    }

    /// Whether a message at `level` passes this threshold
    pub fn allows(self, level: LogLevel) -> bool {
        level != LogLevel::Off && level <= self
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "verbose",
        };
        f.write_str(name)
    }
}
