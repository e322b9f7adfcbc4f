//! The response written to stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smuggler_core::{MetadataPair, Verb, Version};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<Version>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataPair>,
}

#[derive(Serialize)]
struct VersionedOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a Version>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    metadata: &'a [MetadataPair],
}

impl ResourceResponse {
    /// `check`: versions in the order the command emitted them.
    pub fn checked(versions: Vec<Version>) -> Self {
        Self {
            versions,
            ..Self::default()
        }
    }

    /// `in` and `out`: one version plus metadata.
    pub fn versioned(version: Option<Version>, metadata: Vec<MetadataPair>) -> Self {
        Self {
            version,
            metadata,
            ..Self::default()
        }
    }

    /// True when nothing was produced: no version, no versions, no metadata.
    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.versions.is_empty() && self.metadata.is_empty()
    }

    /// Shape expected on stdout: an array for `check`, an object otherwise.
    pub fn to_protocol_json(&self, verb: Verb) -> Result<Value, serde_json::Error> {
        match verb {
            Verb::Check => serde_json::to_value(&self.versions),
            Verb::In | Verb::Out => serde_json::to_value(VersionedOutput {
                version: self.version.as_ref(),
                metadata: &self.metadata,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_response_is_empty() {
        assert!(ResourceResponse::default().is_empty());
        assert!(ResourceResponse::checked(Vec::new()).is_empty());
    }

    #[test]
    fn any_content_makes_response_non_empty() {
        assert!(!ResourceResponse::checked(vec![Version::new("1")]).is_empty());
        assert!(!ResourceResponse::versioned(Some(Version::new("1")), Vec::new()).is_empty());
        assert!(!ResourceResponse::versioned(None, vec![MetadataPair::new("a", "")]).is_empty());
    }

    #[test]
    fn check_serializes_as_array() {
        let response = ResourceResponse::checked(vec![Version::new("1.2.3"), Version::new("1.2.4")]);
        assert_eq!(
            response.to_protocol_json(Verb::Check).unwrap(),
            json!([{"ref": "1.2.3"}, {"ref": "1.2.4"}])
        );
        assert_eq!(
            ResourceResponse::default().to_protocol_json(Verb::Check).unwrap(),
            json!([])
        );
    }

    #[test]
    fn in_serializes_version_and_metadata() {
        let response = ResourceResponse::versioned(
            Some(Version::new("1.2.3")),
            vec![MetadataPair::new("value_2", "2")],
        );
        assert_eq!(
            response.to_protocol_json(Verb::In).unwrap(),
            json!({"version": {"ref": "1.2.3"}, "metadata": [{"name": "value_2", "value": "2"}]})
        );
    }

    #[test]
    fn empty_out_serializes_as_empty_object() {
        let value = ResourceResponse::default().to_protocol_json(Verb::Out).unwrap();
        assert_eq!(value, json!({}));
        let parsed: ResourceResponse = serde_json::from_value(value).unwrap();
        assert!(parsed.is_empty());
    }
}
