//! The serialized (v3) shape of a source map.

use crate::{Mapping, Position, SourceMapError};
use serde::{Deserialize, Serialize};

/// A source map in its canonical JSON structure.
///
/// This is the structured form handed to bundlers; `mappings` stays VLQ
/// encoded. Use [`RawSourceMap::decoded_mappings`] to inspect individual
/// mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    /// Always 3.
    pub version: u8,
    /// The generated file this map belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Prefix for every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Original source names.
    pub sources: Vec<String>,
    /// Embedded original sources, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names (unused by the template generator).
    #[serde(default)]
    pub names: Vec<String>,
    /// VLQ encoded mappings.
    pub mappings: String,
}

impl RawSourceMap {
    /// Parses a source map from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes this source map to JSON text.
    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Converts this source map into a plain JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, SourceMapError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes `mappings` into individual mappings.
    pub fn decoded_mappings(&self) -> Result<Vec<Mapping>, SourceMapError> {
        let map = sourcemap::SourceMap::from_slice(self.to_json()?.as_bytes())?;
        Ok(map
            .tokens()
            .map(|token| Mapping {
                generated: Position::new(token.get_dst_line() + 1, token.get_dst_col()),
                original: Position::new(token.get_src_line() + 1, token.get_src_col()),
                source: token.get_src_id(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_source_map;

    #[test]
    fn test_json_keys_are_camel_case() {
        let map = generate_source_map("App.vue", "<p/>", "<p/>", "/root", 0).unwrap();
        let value = map.to_value().unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["file"], "App.vue");
        assert_eq!(value["sourceRoot"], "/root");
        assert_eq!(value["sourcesContent"][0], "<p/>");
        assert_eq!(value["names"], serde_json::json!([]));
        assert!(value.get("source_root").is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let map = generate_source_map("App.vue", "<p/>", "<p/>", "", 1).unwrap();
        let json = map.to_json().unwrap();
        assert_eq!(RawSourceMap::from_json(&json).unwrap(), map);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            RawSourceMap::from_json("{\"version\": 3}"),
            Err(SourceMapError::Json(_))
        ));
    }
}
