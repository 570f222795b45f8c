// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face tessellation
//!
//! Turns a boundary face into an indexed triangle mesh at a requested level
//! of detail. The flattener goes through the [`FaceTessellator`] trait so a
//! host that already tessellates faces itself can plug in its own.

use crate::triangulation::triangulate_planar_face;
use crate::{Error, Point3, Result, Vector3};
use famglb_model::{CylindricalFace, Face, TriangleMesh};

/// Face tessellator trait
///
/// Implementations turn one face into triangles. The `lod` argument is the
/// level of detail in `(0, 1]`: 0.25 coarse, 0.5 medium, 1.0 fine.
pub trait FaceTessellator: Send + Sync {
    /// Tessellate a face in host coordinates
    fn tessellate(&self, face: &Face, lod: f64) -> Result<TriangleMesh>;
}

/// Tessellator for planar, cylindrical and pre-tessellated faces
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTessellator;

impl DefaultTessellator {
    pub fn new() -> Self {
        Self
    }
}

impl FaceTessellator for DefaultTessellator {
    fn tessellate(&self, face: &Face, lod: f64) -> Result<TriangleMesh> {
        match face {
            Face::Planar(planar) => triangulate_planar_face(planar),
            Face::Cylindrical(cylinder) => tessellate_cylinder(cylinder, lod),
            Face::Tessellated(mesh) => Ok(mesh.clone()),
        }
    }
}

/// Segments used for a full turn of a circle at a level of detail
pub fn circle_segments(radius: f64, lod: f64) -> usize {
    let segments = (radius.sqrt() * 32.0 * lod).ceil() as usize;
    segments.clamp(6, 64)
}

/// Tessellate the side of a cylinder into quads split in two
///
/// Triangles are wound so their normals point away from the axis.
pub fn tessellate_cylinder(face: &CylindricalFace, lod: f64) -> Result<TriangleMesh> {
    if face.radius <= 0.0 || face.height == 0.0 {
        return Err(Error::degenerate_face("cylinder has no radius or height"));
    }
    let axis = face
        .axis
        .try_normalize(1e-12)
        .ok_or_else(|| Error::degenerate_face("cylinder axis has zero length"))?;
    // Make the reference direction perpendicular to the axis
    let x_dir = (face.ref_direction - axis * face.ref_direction.dot(&axis))
        .try_normalize(1e-12)
        .ok_or_else(|| Error::degenerate_face("reference direction parallel to axis"))?;
    let y_dir = axis.cross(&x_dir);

    let sweep = face.end_angle - face.start_angle;
    if sweep.abs() < 1e-12 {
        return Err(Error::degenerate_face("cylinder sweep is empty"));
    }
    let full = circle_segments(face.radius, lod) as f64;
    let segments = ((full * sweep.abs() / std::f64::consts::TAU).ceil() as usize).max(1);

    let lift = axis * face.height;
    let ring_point = |angle: f64| -> Point3<f64> {
        let radial: Vector3<f64> = x_dir * angle.cos() + y_dir * angle.sin();
        face.base + radial * face.radius
    };

    let mut vertices = Vec::with_capacity((segments + 1) * 2);
    for i in 0..=segments {
        let angle = face.start_angle + sweep * (i as f64) / (segments as f64);
        let bottom = ring_point(angle);
        vertices.push(bottom);
        vertices.push(bottom + lift);
    }

    // Reverse winding when sweeping clockwise or extending below the base
    let flip = (sweep < 0.0) != (face.height < 0.0);
    let mut indices = Vec::with_capacity(segments * 6);
    for i in 0..segments as u32 {
        let b0 = i * 2;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        if flip {
            indices.extend_from_slice(&[b0, t1, b1, b0, t0, t1]);
        } else {
            indices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);
        }
    }

    Ok(TriangleMesh::new(vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use famglb_model::PlanarFace;

    fn cylinder(end_angle: f64) -> CylindricalFace {
        CylindricalFace {
            base: Point3::origin(),
            axis: Vector3::z(),
            ref_direction: Vector3::x(),
            radius: 1.0,
            height: 2.0,
            start_angle: 0.0,
            end_angle,
        }
    }

    #[test]
    fn test_circle_segments_follow_lod() {
        assert!(circle_segments(1.0, 0.25) < circle_segments(1.0, 0.5));
        assert!(circle_segments(1.0, 0.5) < circle_segments(1.0, 1.0));
        assert_eq!(circle_segments(0.0, 1.0), 6);
        assert_eq!(circle_segments(100.0, 1.0), 64);
    }

    #[test]
    fn test_cylinder_normals_point_outward() {
        let mesh = tessellate_cylinder(&cylinder(std::f64::consts::TAU), 0.5).unwrap();
        let segments = circle_segments(1.0, 0.5);
        assert_eq!(mesh.triangle_count(), segments * 2);

        for i in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(i).unwrap();
            let normal = (b - a).cross(&(c - a));
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            let radial = Vector3::new(centroid.x, centroid.y, 0.0);
            assert!(normal.dot(&radial) > 0.0, "triangle {} faces inward", i);
        }
    }

    #[test]
    fn test_partial_cylinder_uses_fewer_segments() {
        let half = tessellate_cylinder(&cylinder(std::f64::consts::PI), 1.0).unwrap();
        let full = tessellate_cylinder(&cylinder(std::f64::consts::TAU), 1.0).unwrap();
        assert!(half.triangle_count() < full.triangle_count());
    }

    #[test]
    fn test_degenerate_cylinder() {
        let mut face = cylinder(std::f64::consts::TAU);
        face.radius = 0.0;
        assert!(tessellate_cylinder(&face, 1.0).is_err());

        let mut face = cylinder(std::f64::consts::TAU);
        face.ref_direction = Vector3::z();
        assert!(tessellate_cylinder(&face, 1.0).is_err());
    }

    #[test]
    fn test_default_tessellator_dispatch() {
        let tessellator = DefaultTessellator::new();
        let planar = Face::Planar(PlanarFace {
            outer: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            holes: Vec::new(),
        });
        assert_eq!(tessellator.tessellate(&planar, 0.5).unwrap().triangle_count(), 1);

        let mesh = TriangleMesh::new(vec![Point3::origin(); 6], Vec::new());
        let tessellated = Face::Tessellated(mesh.clone());
        assert_eq!(tessellator.tessellate(&tessellated, 0.5).unwrap(), mesh);
    }
}
