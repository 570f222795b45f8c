// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata payload carried on the scene's `asset.extras`
//!
//! Wire shape:
//!
//! ```json
//! { "rvt": { "parameters": [...], "types": [{ "name": "...", "values": {...} }],
//!            "relationships": [...], "units": { "length": "meters", "angle": "radians" } } }
//! ```
//!
//! Some writers store `extras` (or the inner payload) as a JSON string rather
//! than an object; [`read_metadata`] accepts both.

use crate::error::{ExportError, Result};
use famglb_model::{ConfigurationSnapshot, ParamValue, ParameterDescriptor, ParameterRelationship};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key of the payload inside `asset.extras`
pub const METADATA_KEY: &str = "rvt";

/// Parameter values of one configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeValues {
    pub name: String,
    #[serde(default)]
    pub values: BTreeMap<String, ParamValue>,
}

impl From<&ConfigurationSnapshot> for TypeValues {
    fn from(snapshot: &ConfigurationSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            values: snapshot.values.clone(),
        }
    }
}

/// Units of the exported values
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Units {
    pub length: String,
    pub angle: String,
}

impl Default for Units {
    fn default() -> Self {
        Self {
            length: "meters".to_string(),
            angle: "radians".to_string(),
        }
    }
}

/// Family metadata embedded in the scene file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyMetadata {
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub types: Vec<TypeValues>,
    #[serde(default)]
    pub relationships: Vec<ParameterRelationship>,
    #[serde(default)]
    pub units: Units,
}

impl FamilyMetadata {
    /// Assemble the payload from the schema, the snapshots and the graph
    ///
    /// Every snapshot contributes its values, including snapshots whose
    /// geometry is empty.
    pub fn new(
        parameters: Vec<ParameterDescriptor>,
        snapshots: &[ConfigurationSnapshot],
        relationships: Vec<ParameterRelationship>,
    ) -> Self {
        Self {
            parameters,
            types: snapshots.iter().map(TypeValues::from).collect(),
            relationships,
            units: Units::default(),
        }
    }

    /// Values of a configuration by name
    pub fn type_values(&self, name: &str) -> Option<&BTreeMap<String, ParamValue>> {
        self.types.iter().find(|t| t.name == name).map(|t| &t.values)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    rvt: &'a FamilyMetadata,
}

/// Serialize the payload wrapped under [`METADATA_KEY`]
pub fn metadata_json(metadata: &FamilyMetadata) -> Result<String> {
    Ok(serde_json::to_string(&Envelope { rvt: metadata })?)
}

/// Read the payload from an `extras` value
///
/// `extras` and the value under [`METADATA_KEY`] may each be an object or a
/// JSON string holding one.
pub fn read_metadata(extras: &Value) -> Result<FamilyMetadata> {
    let extras = unwrap_string(extras)?;
    let payload = extras
        .get(METADATA_KEY)
        .ok_or_else(|| ExportError::metadata(format!("missing \"{}\" key", METADATA_KEY)))?;
    let payload = unwrap_string(payload)?;
    serde_json::from_value(payload).map_err(|e| ExportError::metadata(e.to_string()))
}

/// Read the payload from a parsed glTF document
pub fn read_asset_metadata(root: &gltf_json::Root) -> Result<FamilyMetadata> {
    let raw = root
        .asset
        .extras
        .as_ref()
        .ok_or_else(|| ExportError::metadata("asset has no extras"))?;
    let extras: Value = serde_json::from_str(raw.get())?;
    read_metadata(&extras)
}

fn unwrap_string(value: &Value) -> Result<Value> {
    match value {
        Value::String(text) => {
            serde_json::from_str(text).map_err(|e| ExportError::metadata(e.to_string()))
        }
        Value::Object(_) => Ok(value.clone()),
        other => Err(ExportError::metadata(format!(
            "expected an object or a JSON string, found {}",
            famglb_model::json_type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use famglb_model::StorageKind;
    use serde_json::json;

    fn sample() -> FamilyMetadata {
        let parameters = vec![ParameterDescriptor {
            name: "Width".to_string(),
            is_instance: false,
            is_reporting: false,
            is_shared: false,
            storage_type: StorageKind::Double,
            data_type: "autodesk.spec.aec:length-2.0.0".to_string(),
            formula: None,
            guid: None,
        }];
        let mut snapshot = ConfigurationSnapshot::new("Small");
        snapshot
            .values
            .insert("Width".to_string(), ParamValue::Float(0.75));
        snapshot
            .values
            .insert("Mark".to_string(), ParamValue::Text("D1".to_string()));

        FamilyMetadata::new(parameters, &[snapshot], Vec::new())
    }

    #[test]
    fn test_wire_shape() {
        let text = metadata_json(&sample()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        let rvt = &value["rvt"];
        assert_eq!(rvt["units"], json!({ "length": "meters", "angle": "radians" }));
        assert_eq!(rvt["types"][0]["name"], "Small");
        assert_eq!(rvt["types"][0]["values"]["Width"], json!(0.75));
        assert_eq!(rvt["parameters"][0]["storageType"], "Double");
        assert_eq!(rvt["parameters"][0]["isInstance"], false);
        assert!(rvt["parameters"][0].get("guid").is_none());
        assert_eq!(rvt["relationships"], json!([]));
    }

    #[test]
    fn test_read_object_and_string_forms() {
        let metadata = sample();
        let text = metadata_json(&metadata).unwrap();

        let as_object: Value = serde_json::from_str(&text).unwrap();
        let as_string = Value::String(text.clone());
        let inner_string = json!({ "rvt": as_object["rvt"].to_string() });

        assert_eq!(read_metadata(&as_object).unwrap(), metadata);
        assert_eq!(read_metadata(&as_string).unwrap(), metadata);
        assert_eq!(read_metadata(&inner_string).unwrap(), metadata);
        assert_eq!(
            read_metadata(&as_object).unwrap().type_values("Small").unwrap()["Mark"],
            ParamValue::Text("D1".to_string())
        );
    }

    #[test]
    fn test_read_rejects_bad_extras() {
        assert!(matches!(
            read_metadata(&json!({ "other": {} })),
            Err(ExportError::Metadata(_))
        ));
        assert!(matches!(read_metadata(&json!(42)), Err(ExportError::Metadata(_))));
        assert!(matches!(
            read_metadata(&Value::String("{not json".to_string())),
            Err(ExportError::Metadata(_))
        ));
    }
}
