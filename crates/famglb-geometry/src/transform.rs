// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transform composition and the host-to-scene coordinate mapping
//!
//! Host space is Z-up in feet; scene space is Y-up in meters. Each vertex
//! goes through the accumulated transform, the unit scale, then the axis
//! remap `(x, y, z) -> (x, z, -y)`.

use crate::{Point3, Vector3};
use famglb_model::Transform;

/// Combined transform of a child placed inside a parent (`parent * child`)
#[inline]
pub fn compose(parent: &Transform, child: &Transform) -> Transform {
    parent * child
}

/// Apply an affine transform to a point
#[inline]
pub fn transform_point(transform: &Transform, point: &Point3<f64>) -> Point3<f64> {
    transform.transform_point(point)
}

/// Scale to meters and swap Z-up for Y-up
#[inline]
pub fn to_scene_position(point: &Point3<f64>, unit_scale: f64) -> [f32; 3] {
    [
        (point.x * unit_scale) as f32,
        (point.z * unit_scale) as f32,
        (-point.y * unit_scale) as f32,
    ]
}

/// Swap Z-up for Y-up on a direction (no scale, no translation)
#[inline]
pub fn to_scene_direction(direction: &Vector3<f64>) -> [f32; 3] {
    [direction.x as f32, direction.z as f32, (-direction.y) as f32]
}

/// Unit normal of a triangle, `None` when it has no area
#[inline]
pub fn triangle_normal(corners: &[Point3<f64>; 3]) -> Option<Vector3<f64>> {
    let normal = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
    normal.try_normalize(1e-12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use famglb_model::FEET_TO_METERS;

    #[test]
    fn test_axis_remap_is_one_way() {
        let p = to_scene_position(&Point3::new(1.0, 2.0, 3.0), FEET_TO_METERS);
        assert_relative_eq!(p[0], 0.3048, epsilon = 1e-6);
        assert_relative_eq!(p[1], 0.9144, epsilon = 1e-6);
        assert_relative_eq!(p[2], -0.6096, epsilon = 1e-6);

        // Host up becomes scene up; host forward becomes scene backward
        assert_eq!(to_scene_direction(&Vector3::z()), [0.0, 1.0, 0.0]);
        assert_eq!(to_scene_direction(&Vector3::y()), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_compose_applies_child_first() {
        let parent = Transform::new_translation(&Vector3::new(10.0, 0.0, 0.0));
        let child = Transform::new_nonuniform_scaling(&Vector3::new(2.0, 2.0, 2.0));
        let combined = compose(&parent, &child);

        let p = transform_point(&combined, &Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(12.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_triangle_normal() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_relative_eq!(triangle_normal(&corners).unwrap(), Vector3::z(), epsilon = 1e-12);

        let flat = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert!(triangle_normal(&flat).is_none());
    }
}
