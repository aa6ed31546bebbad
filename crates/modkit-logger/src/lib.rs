//! Logging for modkit
//!
//! Scripts log through named [`Logger`] handles. A handle gates each call on
//! its own [`LogLevel`] and forwards what passes to `tracing`, so the usual
//! subscriber set up by [`init_logging`] decides where it ends up.

pub mod level;
pub mod logger;
pub mod logging;

pub use level::LogLevel;
pub use logger::{Logger, LoggerRegistry};
pub use logging::{init_logging, log_directory};
