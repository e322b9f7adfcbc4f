use crate::command::{find_command, CommandDefinition};
use crate::{CONFIG_FILE_ENV, CONFIG_FILE_NAME, DEFAULT_LOG_FILE, LOG_FILE_ENV, LOG_LEVEL_ENV};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

/// Local configuration shipped next to the resource binaries.
///
/// Commands declared here are the fallback catalogue used when a request does
/// not define a command for the verb being run; `params` are default extra
/// parameters that every request may override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            logging: LoggingConfig::default(),
            commands: Vec::new(),
            params: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ValidationError::UnknownLogLevel {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("command at position {index} has an empty name")]
    UnnamedCommand { index: usize },
    #[error("unknown log level '{value}'")]
    UnknownLogLevel { value: String },
}

impl Config {
    /// Loads the config at `path`, or the defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `$SMUGGLER_CONFIG` if set, otherwise `smuggler.toml` beside the running
    /// executable.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_FILE_ENV) {
            return Some(PathBuf::from(path));
        }
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        if let Some(index) = self.commands.iter().position(|c| !c.is_defined()) {
            return Err(ValidationError::UnnamedCommand { index });
        }
        Ok(())
    }

    /// Applies `SMUGGLER_LOG` and `SMUGGLER_LOG_LEVEL` on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(file) = lookup(LOG_FILE_ENV).filter(|v| !v.is_empty()) {
            self.logging.file = PathBuf::from(file);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.is_empty()) {
            self.logging.level = level.parse()?;
        }
        Ok(())
    }

    pub fn find_command(&self, name: &str) -> Option<&CommandDefinition> {
        find_command(&self.commands, name)
    }

    /// Default parameters rendered as environment values.
    pub fn param_values(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    toml::Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}
