//! Child-process environment construction.
//!
//! Layout, highest precedence first:
//! 1. protocol variables (`SMUGGLER_OUTPUT_DIR`, `SMUGGLER_ACTION`, ...)
//! 2. parameters, each as `SMUGGLER_<key>`
//! 3. the inherited parent environment
//!
//! A name that appears more than once resolves to its first occurrence.

use smuggler_core::{Verb, Version};
use std::collections::{BTreeMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Prefix applied to every injected variable.
pub const ENV_PREFIX: &str = "SMUGGLER_";

pub const OUTPUT_DIR_VAR: &str = "SMUGGLER_OUTPUT_DIR";
pub const ACTION_VAR: &str = "SMUGGLER_ACTION";
pub const COMMAND_VAR: &str = "SMUGGLER_COMMAND";
pub const VERSION_ID_VAR: &str = "SMUGGLER_VERSION_ID";
pub const DESTINATION_DIR_VAR: &str = "SMUGGLER_DESTINATION_DIR";
pub const SOURCES_DIR_VAR: &str = "SMUGGLER_SOURCES_DIR";

/// Ordered `NAME=value` entries handed to a child process.
///
/// Names and values are OS strings so inherited variables reach the child
/// byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    entries: Vec<(OsString, OsString)>,
}

impl Environment {
    /// Value of `name` as the child will see it.
    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_os_str())
    }

    /// Like [`Environment::get_os`], for values that are valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_os(name).and_then(OsStr::to_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_os(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// Entries with shadowed duplicates removed, keeping first occurrences.
    pub fn resolved(&self) -> Vec<(&OsStr, &OsStr)> {
        let mut seen = HashSet::new();
        self.iter().filter(|(key, _)| seen.insert(*key)).collect()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.iter()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect()
    }

    fn push(&mut self, name: impl Into<OsString>, value: impl Into<OsString>) {
        self.entries.push((name.into(), value.into()));
    }
}

/// Builds the [`Environment`] for one verb invocation.
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    verb: Verb,
    output_dir: PathBuf,
    command_name: Option<String>,
    version: Option<Version>,
    data_dir: Option<PathBuf>,
    params: BTreeMap<String, String>,
    inherited: Vec<(OsString, OsString)>,
}

impl EnvironmentBuilder {
    pub fn new(verb: Verb, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            verb,
            output_dir: output_dir.into(),
            command_name: None,
            version: None,
            data_dir: None,
            params: BTreeMap::new(),
            inherited: Vec::new(),
        }
    }

    /// Name of the matched command definition; defaults to the verb name.
    pub fn command_name(mut self, name: impl Into<String>) -> Self {
        self.command_name = Some(name.into());
        self
    }

    pub fn version(mut self, version: Option<&Version>) -> Self {
        self.version = version.cloned();
        self
    }

    /// Destination directory for `in`, sources directory for `out`.
    pub fn data_dir(mut self, dir: Option<&Path>) -> Self {
        self.data_dir = dir.map(Path::to_path_buf);
        self
    }

    /// Adds a parameter layer. Keys already present are overwritten.
    pub fn params(mut self, layer: &BTreeMap<String, String>) -> Self {
        self.params
            .extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn inherit<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.inherited
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Inherits the current process environment.
    pub fn inherit_process_env(self) -> Self {
        self.inherit(std::env::vars_os())
    }

    pub fn build(self) -> Environment {
        let mut env = Environment::default();

        env.push(OUTPUT_DIR_VAR, self.output_dir);
        env.push(ACTION_VAR, self.verb.name());
        env.push(
            COMMAND_VAR,
            self.command_name
                .unwrap_or_else(|| self.verb.name().to_string()),
        );

        let version_id = self.version.map(|v| v.id);
        match self.verb {
            Verb::Check => {
                if let Some(id) = version_id.filter(|id| !id.is_empty()) {
                    env.push(VERSION_ID_VAR, id);
                }
            }
            Verb::In => {
                env.push(VERSION_ID_VAR, version_id.unwrap_or_default());
                if let Some(dir) = self.data_dir {
                    env.push(DESTINATION_DIR_VAR, dir);
                }
            }
            Verb::Out => {
                if let Some(dir) = self.data_dir {
                    env.push(SOURCES_DIR_VAR, dir);
                }
            }
        }

        for (key, value) in self.params {
            env.push(format!("{ENV_PREFIX}{key}"), value);
        }

        for (key, value) in self.inherited {
            env.push(key, value);
        }

        env
    }
}
