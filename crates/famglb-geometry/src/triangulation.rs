// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon triangulation
//!
//! Faces arrive as 3D loops. They are projected onto their own plane, cut
//! into triangles with earcutr, and lifted back to the original 3D points.

use crate::{Error, Point2, Point3, Result, Vector3};
use famglb_model::{PlanarFace, TriangleMesh};

const EPSILON: f64 = 1e-10;

/// Newell normal of a closed loop, `None` when the loop has no area
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }

    let mut normal = Vector3::<f64>::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    let len = normal.norm();
    (len > EPSILON).then(|| normal / len)
}

/// In-plane basis `(u, v)` with `u x v == normal`
pub fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Pick the world axis least aligned with the normal
    let reference = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vector3::x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let u = normal.cross(&reference).normalize();
    let v = normal.cross(&u).normalize();
    (u, v)
}

/// Project loops onto a plane through `origin`
fn project(
    points: &[Point3<f64>],
    origin: &Point3<f64>,
    u: &Vector3<f64>,
    v: &Vector3<f64>,
) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(u), d.dot(v))
        })
        .collect()
}

/// Triangulate a 2D outer loop with holes
///
/// Returns triangle indices into the concatenation of `outer` and every hole
/// with at least three points, in that order.
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::triangulation(
            "Need at least 3 points in outer boundary",
        ));
    }

    let holes: Vec<&Vec<Point2<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();

    // A lone triangle needs no ear clipping
    if holes.is_empty() && outer.len() == 3 {
        return Ok(vec![0, 1, 2]);
    }

    let total = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut coords = Vec::with_capacity(total * 2);
    for p in outer {
        coords.extend_from_slice(&[p.x, p.y]);
    }

    let mut hole_starts = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_starts.push(coords.len() / 2);
        for p in hole {
            coords.extend_from_slice(&[p.x, p.y]);
        }
    }

    earcutr::earcut(&coords, &hole_starts, 2).map_err(|e| Error::triangulation(format!("{:?}", e)))
}

/// Triangulate a planar face into an indexed mesh
///
/// The mesh's vertices are the face's own loop points (outer loop first, then
/// holes). Every triangle is wound so its normal agrees with the outer loop.
pub fn triangulate_planar_face(face: &PlanarFace) -> Result<TriangleMesh> {
    let normal = polygon_normal(&face.outer)
        .ok_or_else(|| Error::degenerate_face("outer loop has no area"))?;
    let (u, v) = plane_basis(&normal);
    let origin = face.outer[0];

    let holes: Vec<&Vec<Point3<f64>>> = face.holes.iter().filter(|h| h.len() >= 3).collect();
    let outer_2d = project(&face.outer, &origin, &u, &v);
    let holes_2d: Vec<Vec<Point2<f64>>> = holes
        .iter()
        .map(|h| project(h, &origin, &u, &v))
        .collect();

    let flat = triangulate_polygon_with_holes(&outer_2d, &holes_2d)?;
    if flat.is_empty() {
        return Err(Error::triangulation("no triangles produced"));
    }

    let mut vertices = face.outer.clone();
    for hole in holes {
        vertices.extend_from_slice(hole);
    }

    let mut indices = Vec::with_capacity(flat.len());
    for tri in flat.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let facing = (vertices[b] - vertices[a])
            .cross(&(vertices[c] - vertices[a]))
            .dot(&normal);
        if facing >= 0.0 {
            indices.extend_from_slice(&[a as u32, b as u32, c as u32]);
        } else {
            indices.extend_from_slice(&[a as u32, c as u32, b as u32]);
        }
    }

    Ok(TriangleMesh::new(vertices, indices))
}
