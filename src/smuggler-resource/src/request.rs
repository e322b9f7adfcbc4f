//! The request envelope received on stdin: `{source, version, params}`.

use crate::extract::{env_values, extract_extra_params, strip_reserved, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smuggler_core::command::find_command;
use smuggler_core::{CommandDefinition, Verb, Version};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to decode request: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request field '{field}' must be a JSON object")]
    NotAnObject { field: &'static str },
    #[error("unsupported version value {value}")]
    InvalidVersion { value: String },
    #[error("parameter {key:?} contains a NUL byte and cannot be passed to a command")]
    NulInParam { key: String },
}

/// Resource-level configuration from the pipeline's `source:` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
    /// Hand commands a copy of the request without the fields above.
    #[serde(default)]
    pub filter_raw_request: bool,
    #[serde(default)]
    pub smuggler_params: BTreeMap<String, Value>,
    #[serde(skip)]
    pub extra_params: BTreeMap<String, String>,
}

impl Schema for SourceConfig {
    const FIELDS: &'static [&'static str] = &["commands", "filter_raw_request", "smuggler_params"];

    fn reserved_fields() -> BTreeSet<&'static str> {
        Self::FIELDS
            .iter()
            .chain(CommandDefinition::FIELDS)
            .copied()
            .collect()
    }
}

impl SourceConfig {
    pub fn find_command(&self, name: &str) -> Option<&CommandDefinition> {
        find_command(&self.commands, name)
    }
}

/// Step-level parameters from a `get`/`put` step's `params:` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerbParams {
    #[serde(default)]
    pub smuggler_params: BTreeMap<String, Value>,
    #[serde(skip)]
    pub extra_params: BTreeMap<String, String>,
}

impl Schema for VerbParams {
    const FIELDS: &'static [&'static str] = &["smuggler_params"];
}

#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub verb: Verb,
    pub source: SourceConfig,
    pub version: Option<Version>,
    pub params: VerbParams,
    raw: Map<String, Value>,
}

impl ResourceRequest {
    /// Parses a request. Unknown fields in `source` and `params` are kept as
    /// extra parameters; only malformed known fields are rejected.
    pub fn from_json(verb: Verb, payload: &str) -> Result<Self, RequestError> {
        let raw = match serde_json::from_str::<Value>(payload)? {
            Value::Object(map) => map,
            _ => return Err(RequestError::NotAnObject { field: "request" }),
        };

        let source_raw = section(&raw, "source")?;
        let mut source: SourceConfig = serde_json::from_value(Value::Object(source_raw.clone()))?;
        source.extra_params = extract_extra_params::<SourceConfig>(&source_raw);

        let params_raw = section(&raw, "params")?;
        let mut params: VerbParams = serde_json::from_value(Value::Object(params_raw.clone()))?;
        params.extra_params = extract_extra_params::<VerbParams>(&params_raw);

        let version = parse_version(raw.get("version").unwrap_or(&Value::Null))?;

        let request = Self {
            verb,
            source,
            version,
            params,
            raw,
        };
        // Environment entries cannot hold NUL; reject before anything is spawned.
        if let Some((key, _)) = request
            .merged_params()
            .into_iter()
            .find(|(key, value)| key.contains('\0') || value.contains('\0'))
        {
            return Err(RequestError::NulInParam { key });
        }
        Ok(request)
    }

    pub fn command(&self) -> Option<&CommandDefinition> {
        self.source
            .find_command(self.verb.name())
            .filter(|command| command.is_defined())
    }

    /// Source parameters, then step parameters; later layers win.
    pub fn merged_params(&self) -> BTreeMap<String, String> {
        let mut merged = self.source.extra_params.clone();
        merged.extend(env_values(&self.source.smuggler_params));
        merged.extend(self.params.extra_params.clone());
        merged.extend(env_values(&self.params.smuggler_params));
        merged
    }

    /// The request exactly as received.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// The request with every reserved `source`/`params` field removed.
    pub fn filtered(&self) -> Map<String, Value> {
        let mut filtered = self.raw.clone();
        if let Some(Value::Object(source)) = filtered.get_mut("source") {
            strip_reserved::<SourceConfig>(source);
        }
        if let Some(Value::Object(params)) = filtered.get_mut("params") {
            strip_reserved::<VerbParams>(params);
        }
        filtered
    }

    /// The JSON handed to the command on stdin.
    pub fn stdin_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        if self.source.filter_raw_request {
            serde_json::to_vec(&self.filtered())
        } else {
            serde_json::to_vec(&self.raw)
        }
    }
}

fn section(raw: &Map<String, Value>, field: &'static str) -> Result<Map<String, Value>, RequestError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(RequestError::NotAnObject { field }),
    }
}

/// Accepts `null`, bare string or number ids and any object. A scalar `ref`
/// becomes the id; every other key is kept as sent.
fn parse_version(value: &Value) -> Result<Option<Version>, RequestError> {
    let version = match value {
        Value::Null => return Ok(None),
        Value::String(s) => Version::new(s.trim()),
        Value::Number(n) => Version::new(n.to_string()),
        Value::Object(map) => {
            let mut fields: BTreeMap<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let id = match fields.remove("ref") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                Some(other) => {
                    fields.insert("ref".to_string(), other);
                    String::new()
                }
            };
            Version { id, fields }
        }
        Value::Bool(_) | Value::Array(_) => {
            return Err(RequestError::InvalidVersion {
                value: value.to_string(),
            })
        }
    };
    Ok((!version.is_empty()).then_some(version))
}
