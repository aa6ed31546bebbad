pub mod config;
pub mod demo;
pub mod schema_file;

pub use config::{ConfigLoadError, LoggingConfig, ModkitConfig};
pub use schema_file::SchemaFile;
