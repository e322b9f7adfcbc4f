//! Separation of protocol-reserved fields from free-form extra fields.
//!
//! Every request section that accepts arbitrary keys declares its reserved
//! keys once through [`Schema`]. Whatever remains after removing them is
//! forwarded to commands as extra parameters.

use serde_json::{Map, Value};
use smuggler_core::CommandDefinition;
use std::collections::{BTreeMap, BTreeSet};

/// The JSON field names a type claims for itself.
pub trait Schema {
    /// Top-level field names of the serialized form, in declaration order.
    const FIELDS: &'static [&'static str];

    /// Every key to exclude from the extra parameters of a section of this type.
    fn reserved_fields() -> BTreeSet<&'static str> {
        Self::FIELDS.iter().copied().collect()
    }
}

impl Schema for CommandDefinition {
    const FIELDS: &'static [&'static str] = &["name", "path", "args"];
}

/// Raw keys of `raw` that `T` does not reserve, rendered as environment values.
pub fn extract_extra_params<T: Schema>(raw: &Map<String, Value>) -> BTreeMap<String, String> {
    let reserved = T::reserved_fields();
    raw.iter()
        .filter(|(key, _)| !reserved.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), env_value(value)))
        .collect()
}

/// Drops every key reserved by `T` from `raw`, in place.
pub fn strip_reserved<T: Schema>(raw: &mut Map<String, Value>) {
    for field in T::reserved_fields() {
        raw.remove(field);
    }
}

/// Renders a JSON value as an environment variable value.
///
/// Strings are trimmed, scalars use their JSON text, `null` becomes empty and
/// containers are encoded as compact JSON (keys sorted).
pub fn env_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Renders every value of an explicit parameter bag.
pub fn env_values(params: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), env_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn reserved_keys_are_removed() {
        let raw = object(json!({
            "name": "check",
            "path": "sh",
            "args": ["-c"],
            "param1": "test",
        }));

        let extras = extract_extra_params::<CommandDefinition>(&raw);
        assert_eq!(extras.len(), 1);
        assert_eq!(extras["param1"], "test");
    }

    #[test]
    fn scalars_use_json_text() {
        let raw = object(json!({
            "string": "  padded value ",
            "bool": true,
            "int": 123,
            "float": 1.5,
            "null": null,
        }));

        let extras = extract_extra_params::<CommandDefinition>(&raw);
        assert_eq!(extras["string"], "padded value");
        assert_eq!(extras["bool"], "true");
        assert_eq!(extras["int"], "123");
        assert_eq!(extras["float"], "1.5");
        assert_eq!(extras["null"], "");
    }

    #[test]
    fn containers_serialize_deterministically() {
        let raw = object(json!({
            "list": [1, "two", false],
            "nested": {"zeta": 1, "alpha": {"b": 2, "a": 1}},
        }));

        let extras = extract_extra_params::<CommandDefinition>(&raw);
        assert_eq!(extras["list"], r#"[1,"two",false]"#);
        assert_eq!(extras["nested"], r#"{"alpha":{"a":1,"b":2},"zeta":1}"#);
    }

    #[test]
    fn strip_reserved_keeps_extras() {
        let mut raw = object(json!({"name": "in", "path": "sh", "keep": 1}));
        strip_reserved::<CommandDefinition>(&mut raw);
        assert_eq!(Value::Object(raw), json!({"keep": 1}));
    }

    #[test]
    fn command_definition_fields_match_serialized_shape() {
        let definition = CommandDefinition::new("check", "sh").with_args(["-c", "true"]);
        let serialized = object(serde_json::to_value(&definition).unwrap());
        let keys: BTreeSet<&str> = serialized.keys().map(String::as_str).collect();
        assert_eq!(keys, CommandDefinition::reserved_fields());
    }
}
