// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host geometry graph and the flattened output buffer
//!
//! The host hands out a tree of [`GeometryObject`]s per element. Nested
//! [`GeometryInstance`]s carry a transform and up to two representations of the
//! same content. The flattener turns the whole tree into one
//! [`GeometryBuffer`].

use crate::{DetailLevel, ElementId, ModelError, Result};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// 4x4 affine transform in host units
pub type Transform = Matrix4<f64>;

fn identity() -> Transform {
    Transform::identity()
}

/// Options passed to the host when resolving element geometry
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryOptions {
    /// Requested detail level
    pub detail_level: DetailLevel,
    /// Resolve geometry as seen from this view
    pub view: Option<ElementId>,
    /// Include objects hidden in the current view
    pub include_non_visible: bool,
    /// Ask the host to attach references to faces and edges
    pub compute_references: bool,
}

impl GeometryOptions {
    /// View-independent options at a detail level
    pub fn for_detail(detail_level: DetailLevel) -> Self {
        Self {
            detail_level,
            view: None,
            include_non_visible: true,
            compute_references: true,
        }
    }

    /// View-specific options
    pub fn for_view(detail_level: DetailLevel, view: ElementId) -> Self {
        Self {
            detail_level,
            view: Some(view),
            include_non_visible: true,
            compute_references: true,
        }
    }
}

/// Indexed triangle mesh as authored by the host
///
/// When `indices` is empty, not a multiple of three, or references a vertex
/// that does not exist, the mesh is read in per-triangle mode: triangle `i`
/// is made of `vertices[3i..3i+3]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3<f64>>,
    #[serde(default)]
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Point3<f64>>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Whether `indices` can be used to address `vertices`
    pub fn is_shared_vertex(&self) -> bool {
        !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }

    /// Number of triangles, in whichever mode applies
    pub fn triangle_count(&self) -> usize {
        if self.is_shared_vertex() {
            self.indices.len() / 3
        } else {
            self.vertices.len() / 3
        }
    }

    /// Corner positions of triangle `i`
    pub fn triangle(&self, i: usize) -> Option<[Point3<f64>; 3]> {
        if self.is_shared_vertex() {
            let tri = self.indices.get(i * 3..i * 3 + 3)?;
            Some([
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ])
        } else {
            let tri = self.vertices.get(i * 3..i * 3 + 3)?;
            Some([tri[0], tri[1], tri[2]])
        }
    }
}

/// Planar face bounded by an outer loop and optional holes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarFace {
    pub outer: Vec<Point3<f64>>,
    #[serde(default)]
    pub holes: Vec<Vec<Point3<f64>>>,
}

/// Portion of a cylinder surface
///
/// The surface sweeps from `start_angle` to `end_angle` (radians) around
/// `axis`, measured from `ref_direction`, and extends `height` along `axis`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CylindricalFace {
    pub base: Point3<f64>,
    pub axis: Vector3<f64>,
    pub ref_direction: Vector3<f64>,
    pub radius: f64,
    pub height: f64,
    #[serde(default)]
    pub start_angle: f64,
    #[serde(default = "full_turn")]
    pub end_angle: f64,
}

fn full_turn() -> f64 {
    std::f64::consts::TAU
}

/// Boundary face of a solid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    Planar(PlanarFace),
    Cylindrical(CylindricalFace),
    /// Face the host has already tessellated
    Tessellated(TriangleMesh),
}

/// Closed boundary representation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub faces: Vec<Face>,
    /// Enclosed volume in cubic host units; zero for degenerate solids
    pub volume: f64,
}

/// Placed copy of shared geometry
///
/// Either representation may be absent. When both are present the flattener
/// emits both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryInstance {
    #[serde(default = "identity")]
    pub transform: Transform,
    #[serde(default)]
    pub instance_geometry: Option<Vec<GeometryObject>>,
    #[serde(default)]
    pub symbol_geometry: Option<Vec<GeometryObject>>,
}

/// Node of an element's geometry tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryObject {
    Solid(Solid),
    Instance(GeometryInstance),
    Mesh(TriangleMesh),
    Face(Face),
    Curve { points: Vec<Point3<f64>> },
    Point { position: Point3<f64> },
    Text { content: String },
}

impl GeometryObject {
    /// Short kind name for logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            GeometryObject::Solid(_) => "solid",
            GeometryObject::Instance(_) => "instance",
            GeometryObject::Mesh(_) => "mesh",
            GeometryObject::Face(_) => "face",
            GeometryObject::Curve { .. } => "curve",
            GeometryObject::Point { .. } => "point",
            GeometryObject::Text { .. } => "text",
        }
    }
}

/// Flattened triangle soup in meters, Y-up
///
/// `normals` and `tex_coords` run parallel to `vertices`. The buffer is in
/// shared-vertex mode when every index addresses a vertex, otherwise it is
/// read per triangle (`vertices[3i..3i+3]`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryBuffer {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl GeometryBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Triangle count as reported to callers (`indices / 3`)
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether every index addresses an existing vertex
    pub fn is_shared_vertex(&self) -> bool {
        !self.indices.is_empty()
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }

    /// Append one triangle as three new vertices sharing `normal`
    pub fn push_triangle(&mut self, corners: [[f32; 3]; 3], normal: [f32; 3]) {
        let base = self.vertices.len() as u32;
        for corner in corners {
            self.vertices.push(corner);
            self.normals.push(normal);
            self.tex_coords.push([0.0, 0.0]);
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Corner positions of triangle `i`, in either mode
    pub fn triangle_positions(&self, i: usize) -> Option<[[f32; 3]; 3]> {
        if self.is_shared_vertex() {
            let tri = self.indices.get(i * 3..i * 3 + 3)?;
            Some([
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ])
        } else {
            let tri = self.vertices.get(i * 3..i * 3 + 3)?;
            Some([tri[0], tri[1], tri[2]])
        }
    }

    /// Axis-aligned bounds of all vertices
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        Some((min, max))
    }

    /// Check the layout invariants
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(ModelError::invalid_geometry(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if self.normals.len() != self.vertices.len() || self.tex_coords.len() != self.vertices.len()
        {
            return Err(ModelError::invalid_geometry(format!(
                "attribute lengths differ: {} vertices, {} normals, {} tex coords",
                self.vertices.len(),
                self.normals.len(),
                self.tex_coords.len()
            )));
        }
        if !self.indices.is_empty() && !self.is_shared_vertex() && self.vertices.len() % 3 != 0 {
            return Err(ModelError::invalid_geometry(
                "indices out of range and vertex count not a multiple of 3",
            ));
        }
        Ok(())
    }
}
