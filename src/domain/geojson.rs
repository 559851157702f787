//! GeoJSON documents as received from users.
//!
//! Only the parts the pipeline touches are interpreted: the optional `type`
//! member, the optional `features` array and each feature's `properties`.
//! Everything else is carried through to the rendering service untouched.

use serde_json::{Map, Value};

use super::{error::DocumentError, style::LineStyle};

pub const LINE_COLOR_KEY: &str = "linecolor";
pub const LINE_WIDTH_KEY: &str = "linewidth";
pub const LINE_OPACITY_KEY: &str = "lineopacity";

#[derive(Debug, Clone, PartialEq)]
pub struct GeoJson(Map<String, Value>);

impl GeoJson {
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_slice(bytes).map_err(DocumentError::InvalidJson)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(members) if members.is_empty() => Err(DocumentError::Empty),
            Value::Object(members) => Ok(Self(members)),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// The document's `type` member, when it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn feature_count(&self) -> Option<usize> {
        self.0
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::len)
    }

    /// Overwrite the line style of every feature, returning how many were styled.
    ///
    /// Features without a `properties` mapping (or with `null` in its place)
    /// receive a fresh one. Entries of `features` that are not objects are
    /// skipped. Applying the same style twice leaves the document unchanged.
    pub fn apply_style(&mut self, style: &LineStyle) -> usize {
        let Some(features) = self.0.get_mut("features").and_then(Value::as_array_mut) else {
            return 0;
        };

        let mut styled = 0;
        for feature in features.iter_mut() {
            let Some(feature) = feature.as_object_mut() else {
                continue;
            };

            let properties = feature
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if !properties.is_object() {
                *properties = Value::Object(Map::new());
            }

            if let Value::Object(properties) = properties {
                properties.insert(LINE_COLOR_KEY.to_string(), Value::from(style.color.as_str()));
                properties.insert(LINE_WIDTH_KEY.to_string(), Value::from(style.width));
                properties.insert(LINE_OPACITY_KEY.to_string(), Value::from(style.opacity));
                styled += 1;
            }
        }

        styled
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
