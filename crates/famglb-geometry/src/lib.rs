// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # famglb Geometry Flattening
//!
//! Turns the geometry a host document hands out (solids, faces, meshes and
//! nested instances) into one [`GeometryBuffer`](famglb_model::GeometryBuffer)
//! in meters with Y up. The crate only depends on the traits in
//! `famglb-model`, never on a concrete host.
//!
//! ## Overview
//!
//! - **Triangulation**: planar faces with holes via earcutr
//! - **Tessellation**: cylindrical faces at a level of detail
//! - **Transforms**: instance composition and the Z-up to Y-up remap
//! - **Flattening**: explicit-stack traversal with counted skips
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use famglb_geometry::GeometryFlattener;
//! use famglb_model::DetailLevel;
//!
//! let flattener = GeometryFlattener::new(DetailLevel::Fine);
//! let (buffer, report) = flattener.flatten(&document);
//!
//! println!("{} triangles, {} items skipped", buffer.triangle_count(), report.skipped());
//! ```

pub mod error;
pub mod flattener;
pub mod tessellate;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

// Re-export main types
pub use error::{Error, Result};
pub use flattener::{FlattenReport, GeometryFlattener};
pub use tessellate::{circle_segments, tessellate_cylinder, DefaultTessellator, FaceTessellator};
pub use transform::{compose, to_scene_direction, to_scene_position};
pub use triangulation::{triangulate_planar_face, triangulate_polygon_with_holes};
