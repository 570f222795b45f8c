// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON description of a host document
//!
//! Values in `types` are written loosely (plain numbers and strings); they are
//! coerced to each parameter's storage kind when the document is loaded.

use famglb_model::{
    DimensionRecord, ElementId, ElementRecord, FamilyParameter, GeometryObject, View3D,
};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

/// Top-level document description
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentDescription {
    pub title: String,
    #[serde(default = "default_true")]
    pub is_family_document: bool,
    #[serde(default)]
    pub parameters: Vec<FamilyParameter>,
    /// Typed data-type identifiers by parameter name
    #[serde(default)]
    pub data_types: BTreeMap<String, String>,
    /// Parameter names whose data-type lookup raises an error
    #[serde(default)]
    pub failing_data_types: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeDescription>,
    /// Defaults to the first configuration
    #[serde(default)]
    pub current_type: Option<String>,
    #[serde(default)]
    pub elements: Vec<ElementDescription>,
    #[serde(default)]
    pub views: Vec<ViewDescription>,
    #[serde(default)]
    pub dimensions: Vec<DimensionRecord>,
}

/// One configuration and its values by parameter name
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeDescription {
    pub name: String,
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}

/// An element with optional authored and parametric geometry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementDescription {
    #[serde(flatten)]
    pub record: ElementRecord,
    /// Geometry that does not depend on parameter values
    #[serde(default)]
    pub geometry: Vec<GeometryObject>,
    /// Box whose extents follow parameter values
    #[serde(default)]
    pub parametric_box: Option<ParametricBox>,
}

/// Box extent, either fixed or driven by a parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extent {
    Fixed(f64),
    Parameter(String),
}

/// Axis-aligned box rebuilt on every regeneration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParametricBox {
    #[serde(default = "Point3::origin")]
    pub origin: Point3<f64>,
    /// Extent along X
    pub width: Extent,
    /// Extent along Y
    pub depth: Extent,
    /// Extent along Z
    pub height: Extent,
}

/// 3D view and the elements visible in it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewDescription {
    #[serde(flatten)]
    pub view: View3D,
    #[serde(default)]
    pub visible_elements: Vec<ElementId>,
}
