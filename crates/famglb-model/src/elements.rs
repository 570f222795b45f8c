// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element, view and dimension records returned by an [`ElementCollector`]
//!
//! [`ElementCollector`]: crate::ElementCollector

use crate::{Category, ElementId};
use serde::{Deserialize, Serialize};

/// Summary of a document element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: ElementId,
    #[serde(default)]
    pub name: String,
    pub category: Category,
    /// Type elements carry no placed geometry of their own
    #[serde(default)]
    pub is_element_type: bool,
    /// Names of the parameters this element exposes
    #[serde(default)]
    pub parameter_names: Vec<String>,
}

/// 3D view of the document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct View3D {
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub is_template: bool,
}

/// Reference to a geometric sub-entity (face, edge, reference plane)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryReference {
    /// Element owning the sub-entity
    pub element: ElementId,
    /// Index of the sub-entity within the element
    #[serde(default)]
    pub index: u32,
    /// Sub-entity kind tag (e.g., "SURFACE", "LINEAR")
    pub kind: String,
}

/// Dimension annotation, optionally labelled with a family parameter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionRecord {
    pub id: ElementId,
    pub category: String,
    /// Identity of the parameter labelling this dimension
    #[serde(default)]
    pub label: Option<ElementId>,
    #[serde(default)]
    pub references: Vec<GeometryReference>,
}
