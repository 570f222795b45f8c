// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for family data representation

use crate::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type-safe host element identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct ElementId(pub i64);

impl ElementId {
    /// The host's "no element" sentinel
    pub const INVALID: ElementId = ElementId(-1);
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId(id)
    }
}

impl From<ElementId> for i64 {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

/// How a parameter stores its value in the host
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum StorageKind {
    /// Floating point, stored in the host's internal units
    Double,
    /// Integer (also used for yes/no parameters)
    Integer,
    /// Free text
    String,
    /// Reference to another element
    ElementId,
}

impl StorageKind {
    /// Name as written into the metadata payload
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Double => "Double",
            StorageKind::Integer => "Integer",
            StorageKind::String => "String",
            StorageKind::ElementId => "ElementId",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value tagged with its storage kind
///
/// Serialized untagged: numbers for `Float`, `Integer` and `EntityRef`, a
/// string for `Text`. `Integer` is declared before `Float` so untagged decoding
/// keeps whole numbers as integers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
    #[serde(skip_deserializing)]
    EntityRef(i64),
}

impl ParamValue {
    /// Storage kind this value is legal for
    pub fn kind(&self) -> StorageKind {
        match self {
            ParamValue::Float(_) => StorageKind::Double,
            ParamValue::Integer(_) => StorageKind::Integer,
            ParamValue::Text(_) => StorageKind::String,
            ParamValue::EntityRef(_) => StorageKind::ElementId,
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Integer(v) | ParamValue::EntityRef(v) => Some(*v as f64),
            ParamValue::Text(_) => None,
        }
    }

    /// Text view of the value, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a loosely typed JSON value into the variant `kind` requires
    ///
    /// Numbers are accepted for `Double`; whole numbers and booleans for
    /// `Integer`; any scalar for `String`; whole numbers for `ElementId`.
    pub fn from_json(
        parameter: &str,
        value: &serde_json::Value,
        kind: StorageKind,
    ) -> Result<ParamValue> {
        use serde_json::Value;

        let mismatch = || ModelError::type_mismatch(parameter, kind, json_type_name(value));

        match kind {
            StorageKind::Double => value.as_f64().map(ParamValue::Float).ok_or_else(mismatch),
            StorageKind::Integer => match value {
                Value::Bool(b) => Ok(ParamValue::Integer(i64::from(*b))),
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .map(ParamValue::Integer)
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            StorageKind::String => match value {
                Value::String(s) => Ok(ParamValue::Text(s.clone())),
                Value::Number(n) => Ok(ParamValue::Text(n.to_string())),
                Value::Bool(b) => Ok(ParamValue::Text(b.to_string())),
                _ => Err(mismatch()),
            },
            StorageKind::ElementId => value
                .as_i64()
                .map(ParamValue::EntityRef)
                .ok_or_else(mismatch),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Integer(v) | ParamValue::EntityRef(v) => write!(f, "{}", v),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Short JSON type name for error messages
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "integer",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// View detail level requested for geometry extraction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Coarse,
    #[default]
    Medium,
    Fine,
}

impl DetailLevel {
    /// Face triangulation level of detail for this setting
    pub fn lod(&self) -> f64 {
        match self {
            DetailLevel::Coarse => 0.25,
            DetailLevel::Medium => 0.5,
            DetailLevel::Fine => 1.0,
        }
    }
}

impl FromStr for DetailLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "coarse" => Ok(DetailLevel::Coarse),
            "medium" => Ok(DetailLevel::Medium),
            "fine" => Ok(DetailLevel::Fine),
            other => Err(ModelError::other(format!("Unknown detail level: {}", other))),
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailLevel::Coarse => f.write_str("coarse"),
            DetailLevel::Medium => f.write_str("medium"),
            DetailLevel::Fine => f.write_str("fine"),
        }
    }
}

/// Broad category classification
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Physical model geometry
    #[default]
    Model,
    /// Dimensions, tags, text
    Annotation,
    /// Reference planes, levels and other internal objects
    Internal,
}

/// Element category
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Display name (e.g., "Doors", "Dimensions")
    pub name: String,
    /// Category classification
    #[serde(default)]
    pub kind: CategoryKind,
}

impl Category {
    /// Check if this is a model category
    pub fn is_model(&self) -> bool {
        self.kind == CategoryKind::Model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_level_lod() {
        assert_eq!(DetailLevel::Coarse.lod(), 0.25);
        assert_eq!(DetailLevel::Medium.lod(), 0.5);
        assert_eq!(DetailLevel::Fine.lod(), 1.0);
        assert_eq!(DetailLevel::default(), DetailLevel::Medium);
        assert_eq!("FINE".parse::<DetailLevel>().unwrap(), DetailLevel::Fine);
        assert!("ultra".parse::<DetailLevel>().is_err());
    }

    #[test]
    fn test_param_value_from_json() {
        assert_eq!(
            ParamValue::from_json("Width", &json!(1.5), StorageKind::Double).unwrap(),
            ParamValue::Float(1.5)
        );
        assert_eq!(
            ParamValue::from_json("Count", &json!(3), StorageKind::Integer).unwrap(),
            ParamValue::Integer(3)
        );
        assert_eq!(
            ParamValue::from_json("Visible", &json!(true), StorageKind::Integer).unwrap(),
            ParamValue::Integer(1)
        );
        assert_eq!(
            ParamValue::from_json("Mark", &json!(42), StorageKind::String).unwrap(),
            ParamValue::Text("42".to_string())
        );
        assert_eq!(
            ParamValue::from_json("Material", &json!(1234), StorageKind::ElementId).unwrap(),
            ParamValue::EntityRef(1234)
        );
    }

    #[test]
    fn test_param_value_from_json_rejects_mismatch() {
        let err = ParamValue::from_json("Count", &json!(2.5), StorageKind::Integer).unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));
        assert!(ParamValue::from_json("Width", &json!("wide"), StorageKind::Double).is_err());
        assert!(ParamValue::from_json("Mark", &json!(null), StorageKind::String).is_err());
    }

    #[test]
    fn test_param_value_serialization() {
        let values = vec![
            ParamValue::Float(0.9144),
            ParamValue::Integer(2),
            ParamValue::Text("Oak".to_string()),
            ParamValue::EntityRef(-1),
        ];
        let text = serde_json::to_string(&values).unwrap();
        assert_eq!(text, r#"[0.9144,2,"Oak",-1]"#);

        let decoded: Vec<ParamValue> = serde_json::from_str(r#"[0.0, 7, "x"]"#).unwrap();
        assert_eq!(decoded[0], ParamValue::Float(0.0));
        assert_eq!(decoded[1], ParamValue::Integer(7));
        assert_eq!(decoded[2], ParamValue::Text("x".to_string()));
    }

    #[test]
    fn test_storage_kind_names() {
        assert_eq!(StorageKind::ElementId.to_string(), "ElementId");
        assert_eq!(
            serde_json::to_string(&StorageKind::Double).unwrap(),
            r#""Double""#
        );
    }
}
