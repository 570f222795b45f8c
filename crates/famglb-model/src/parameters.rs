// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter definitions, per-configuration snapshots and relationships
//!
//! Field names of the serialized types are part of the metadata wire format
//! read by the viewer, hence the camelCase renames.

use crate::{ElementId, GeometryBuffer, ParamValue, StorageKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter definition as the host stores it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FamilyParameter {
    /// Host identity of the definition
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub is_instance: bool,
    #[serde(default)]
    pub is_reporting: bool,
    #[serde(default)]
    pub is_shared: bool,
    /// Persistent identifier, only meaningful for shared parameters
    #[serde(default)]
    pub guid: Option<String>,
    pub storage_kind: StorageKind,
    #[serde(default)]
    pub formula: Option<String>,
}

/// Schema entry written to the metadata payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    pub is_instance: bool,
    pub is_reporting: bool,
    pub is_shared: bool,
    pub storage_type: StorageKind,
    /// Domain-type tag, or the storage kind name when the host has none
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

/// Values and geometry of one configuration ("family type")
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigurationSnapshot {
    pub name: String,
    pub values: BTreeMap<String, ParamValue>,
    pub geometry: GeometryBuffer,
}

impl ConfigurationSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// How a relationship target is tied to a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A dimension labelled with the parameter
    Dimension,
    /// An element exposing a parameter of the same name
    ElementParameter,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Dimension => f.write_str("Dimension"),
            TargetKind::ElementParameter => f.write_str("ElementParameter"),
        }
    }
}

/// Element driven by a parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipTarget {
    /// Opaque element identifier
    pub element_id: String,
    pub category: String,
    pub geometry_type: TargetKind,
    /// `;`-joined stable representations of the dimension's references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_stable_representation: Option<String>,
}

/// Dependency and target graph entry for one parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRelationship {
    pub parameter_name: String,
    pub formula: Option<String>,
    pub is_reporting: bool,
    pub dependencies: Vec<String>,
    pub targets: Vec<RelationshipTarget>,
}

impl ParameterRelationship {
    pub fn new(parameter_name: impl Into<String>) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            formula: None,
            is_reporting: false,
            dependencies: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Whether a target with this element id and kind is already recorded
    pub fn has_target(&self, element_id: &str, kind: TargetKind) -> bool {
        self.targets
            .iter()
            .any(|t| t.element_id == element_id && t.geometry_type == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_wire_names() {
        let descriptor = ParameterDescriptor {
            name: "Width".to_string(),
            is_instance: false,
            is_reporting: false,
            is_shared: false,
            storage_type: StorageKind::Double,
            data_type: "autodesk.spec.aec:length-2.0.0".to_string(),
            formula: None,
            guid: None,
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["isInstance"], false);
        assert_eq!(value["storageType"], "Double");
        assert_eq!(value["dataType"], "autodesk.spec.aec:length-2.0.0");
        assert!(value.get("guid").is_none());
        assert!(value.get("formula").is_none());
    }

    #[test]
    fn test_relationship_wire_names() {
        let mut relationship = ParameterRelationship::new("Height");
        relationship.targets.push(RelationshipTarget {
            element_id: "42".to_string(),
            category: "Dimensions".to_string(),
            geometry_type: TargetKind::Dimension,
            reference_stable_representation: Some("a:1:SURFACE;b:2:SURFACE".to_string()),
        });
        assert!(relationship.has_target("42", TargetKind::Dimension));
        assert!(!relationship.has_target("42", TargetKind::ElementParameter));

        let value = serde_json::to_value(&relationship).unwrap();
        assert_eq!(value["parameterName"], "Height");
        assert!(value["formula"].is_null());
        assert_eq!(value["targets"][0]["geometryType"], "Dimension");
        assert_eq!(value["targets"][0]["elementId"], "42");
    }
}
