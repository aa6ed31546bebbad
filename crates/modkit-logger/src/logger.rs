use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::level::LogLevel;

struct LoggerInner {
    name: String,
    level: AtomicU8,
}

/// Named, leveled logging handle
///
/// Cloning a `Logger` yields another handle to the same logger, so a level
/// change made through one clone is seen by all of them.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Create a standalone logger. Prefer [`LoggerRegistry::get_or_create`]
    /// so that handles with the same name are shared.
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                level: AtomicU8::new(level as u8),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.inner.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level().allows(level)
    }

    /// Log a message at `level` if this handle's threshold lets it through
    pub fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }

        let name = self.name();
        match level {
            LogLevel::Off => {}
            LogLevel::Error => tracing::error!(target: "modkit", logger = name, "{}", args),
            LogLevel::Warn => tracing::warn!(target: "modkit", logger = name, "{}", args),
            LogLevel::Info => tracing::info!(target: "modkit", logger = name, "{}", args),
            LogLevel::Debug => tracing::debug!(target: "modkit", logger = name, "{}", args),
            LogLevel::Verbose => tracing::trace!(target: "modkit", logger = name, "{}", args),
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    pub fn verbose(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Verbose, args);
    }

    /// Whether two handles refer to the same logger
    pub fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .finish()
    }
}

/// Lookup-or-create store of loggers keyed by name
#[derive(Debug)]
pub struct LoggerRegistry {
    loggers: BTreeMap<String, Logger>,
    default_level: LogLevel,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::with_default_level(LogLevel::default())
    }

    /// Loggers created by this registry start at `default_level`
    pub fn with_default_level(default_level: LogLevel) -> Self {
        Self {
            loggers: BTreeMap::new(),
            default_level,
        }
    }

    /// Return the logger called `name`, creating it on first use
    pub fn get_or_create(&mut self, name: &str) -> Logger {
        let default_level = self.default_level;
        self.loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name, default_level))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Logger> {
        self.loggers.get(name).cloned()
    }

    /// Register an externally built logger under its own name, replacing any
    /// previous logger with that name
    pub fn insert(&mut self, logger: Logger) {
        self.loggers.insert(logger.name().to_string(), logger);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.loggers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
