pub mod command;
pub mod config;
pub mod logging;
pub mod models;

pub use command::CommandDefinition;
pub use config::{Config, ConfigError, LogLevel, LoggingConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{MetadataPair, UnknownVerb, Verb, Version};

pub const APP_NAME: &str = "smuggler";

/// Path of the log file written by every invocation.
pub const LOG_FILE_ENV: &str = "SMUGGLER_LOG";
/// Overrides `logging.level` from the config file.
pub const LOG_LEVEL_ENV: &str = "SMUGGLER_LOG_LEVEL";
/// Overrides the location of the local config file.
pub const CONFIG_FILE_ENV: &str = "SMUGGLER_CONFIG";

pub const DEFAULT_LOG_FILE: &str = "/tmp/smuggler.log";
pub const CONFIG_FILE_NAME: &str = "smuggler.toml";
