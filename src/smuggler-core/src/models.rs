use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three resource operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Discover new versions.
    Check,
    /// Fetch a version into a destination directory.
    In,
    /// Publish a version from a sources directory.
    Out,
}

impl Verb {
    pub const ALL: [Verb; 3] = [Verb::Check, Verb::In, Verb::Out];

    /// The verb name, which is also the command name looked up in the catalogue.
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Check => "check",
            Verb::In => "in",
            Verb::Out => "out",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown verb '{0}', expected one of check, in, out")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.name() == value)
            .ok_or_else(|| UnknownVerb(value.to_string()))
    }
}

/// An opaque resource version.
///
/// Usually `{"ref": "<id>"}`. Any other keys the pipeline sent are kept in
/// `fields` and written back unchanged; an object without `ref` has an empty
/// `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Version {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a key carried alongside `ref`.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// No `ref` and no other keys.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.fields.is_empty()
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return f.write_str(&self.id);
        }
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// A `name=value` line emitted by a command. Order and duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPair {
    pub name: String,
    pub value: String,
}

impl MetadataPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
