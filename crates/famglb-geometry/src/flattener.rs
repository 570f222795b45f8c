// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Flattener - host geometry trees to one triangle buffer
//!
//! Walks every element's geometry depth-first with an explicit stack of
//! `(object, accumulated transform)` pairs. Solids, faces and meshes are
//! triangulated and appended as unshared triangles; instances push their
//! children with the composed transform. Anything that cannot be rendered is
//! counted in a [`FlattenReport`] rather than failing the pass.

use crate::tessellate::{DefaultTessellator, FaceTessellator};
use crate::transform::{
    compose, to_scene_direction, to_scene_position, transform_point, triangle_normal,
};
use famglb_model::{
    DetailLevel, ElementCollector, ElementId, Face, FamilyDocument, GeometryBuffer, GeometryObject,
    GeometryOptions, Transform, TriangleMesh,
};
use log::debug;
use std::sync::Arc;

/// Counts of what a flatten pass visited and skipped
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlattenReport {
    /// Elements that returned a geometry tree
    pub elements_with_geometry: usize,
    /// Solids skipped for having no volume
    pub degenerate_solids: usize,
    /// Curves, points and text
    pub non_renderable: usize,
    /// Faces the tessellator rejected
    pub failed_faces: usize,
    /// Zero-area triangles dropped
    pub degenerate_triangles: usize,
    /// Whether geometry came from the per-view retry
    pub used_view_fallback: bool,
}

impl FlattenReport {
    /// Total items skipped for any reason
    pub fn skipped(&self) -> usize {
        self.degenerate_solids + self.non_renderable + self.failed_faces + self.degenerate_triangles
    }
}

/// Flattens a document's model geometry into a [`GeometryBuffer`]
pub struct GeometryFlattener {
    tessellator: Arc<dyn FaceTessellator>,
    detail_level: DetailLevel,
}

impl GeometryFlattener {
    /// Create a flattener with the default face tessellator
    pub fn new(detail_level: DetailLevel) -> Self {
        Self::with_tessellator(Arc::new(DefaultTessellator::new()), detail_level)
    }

    /// Create a flattener with a custom face tessellator
    pub fn with_tessellator(
        tessellator: Arc<dyn FaceTessellator>,
        detail_level: DetailLevel,
    ) -> Self {
        Self {
            tessellator,
            detail_level,
        }
    }

    pub fn detail_level(&self) -> DetailLevel {
        self.detail_level
    }

    /// Flatten all visible model geometry of a document
    ///
    /// In a family document every non-type element is visited; otherwise only
    /// elements in model categories. If that yields no vertices, every
    /// non-template 3D view is tried with view-specific options.
    pub fn flatten(&self, document: &dyn FamilyDocument) -> (GeometryBuffer, FlattenReport) {
        let collector = document.collector();
        let unit_scale = document.unit_scale();
        let is_family = document.is_family_document();

        let mut buffer = GeometryBuffer::new();
        let mut report = FlattenReport::default();

        let options = GeometryOptions::for_detail(self.detail_level);
        let element_ids: Vec<ElementId> = collector
            .elements()
            .into_iter()
            .filter(|e| !e.is_element_type && (is_family || e.category.is_model()))
            .map(|e| e.id)
            .collect();
        self.flatten_elements(
            collector,
            &element_ids,
            &options,
            unit_scale,
            &mut buffer,
            &mut report,
        );

        if buffer.is_empty() {
            let types: Vec<ElementId> = collector
                .elements()
                .into_iter()
                .filter(|e| e.is_element_type)
                .map(|e| e.id)
                .collect();

            for view in collector.views_3d().into_iter().filter(|v| !v.is_template) {
                debug!("No geometry found, retrying through view '{}'", view.name);
                let options = GeometryOptions::for_view(self.detail_level, view.id);
                let visible: Vec<ElementId> = collector
                    .visible_elements(view.id)
                    .into_iter()
                    .filter(|id| !types.contains(id))
                    .collect();
                self.flatten_elements(
                    collector,
                    &visible,
                    &options,
                    unit_scale,
                    &mut buffer,
                    &mut report,
                );
            }
            report.used_view_fallback = true;
        }

        debug!(
            "Flattened {} elements: {} vertices, {} triangles, {} items skipped ({:?})",
            report.elements_with_geometry,
            buffer.vertex_count(),
            buffer.triangle_count(),
            report.skipped(),
            report
        );

        (buffer, report)
    }

    fn flatten_elements(
        &self,
        collector: &dyn ElementCollector,
        ids: &[ElementId],
        options: &GeometryOptions,
        unit_scale: f64,
        buffer: &mut GeometryBuffer,
        report: &mut FlattenReport,
    ) {
        for &id in ids {
            if let Some(objects) = collector.element_geometry(id, options) {
                report.elements_with_geometry += 1;
                self.flatten_objects(&objects, &Transform::identity(), unit_scale, buffer, report);
            }
        }
    }

    /// Flatten a list of geometry objects placed under `root`
    pub fn flatten_objects(
        &self,
        objects: &[GeometryObject],
        root: &Transform,
        unit_scale: f64,
        buffer: &mut GeometryBuffer,
        report: &mut FlattenReport,
    ) {
        let lod = self.detail_level.lod();

        // Reversed so objects pop in authored order
        let mut stack: Vec<(&GeometryObject, Transform)> =
            objects.iter().rev().map(|o| (o, *root)).collect();

        while let Some((object, transform)) = stack.pop() {
            match object {
                GeometryObject::Solid(solid) => {
                    if solid.volume <= 0.0 {
                        report.degenerate_solids += 1;
                        continue;
                    }
                    for face in &solid.faces {
                        self.append_face(face, lod, &transform, unit_scale, buffer, report);
                    }
                }
                GeometryObject::Instance(instance) => {
                    let combined = compose(&transform, &instance.transform);
                    // Instance geometry is emitted before symbol geometry
                    for children in [&instance.symbol_geometry, &instance.instance_geometry]
                        .into_iter()
                        .flatten()
                    {
                        stack.extend(children.iter().rev().map(|o| (o, combined)));
                    }
                }
                GeometryObject::Mesh(mesh) => {
                    append_mesh(mesh, &transform, unit_scale, buffer, report);
                }
                GeometryObject::Face(face) => {
                    self.append_face(face, lod, &transform, unit_scale, buffer, report);
                }
                GeometryObject::Curve { .. }
                | GeometryObject::Point { .. }
                | GeometryObject::Text { .. } => {
                    report.non_renderable += 1;
                }
            }
        }
    }

    fn append_face(
        &self,
        face: &Face,
        lod: f64,
        transform: &Transform,
        unit_scale: f64,
        buffer: &mut GeometryBuffer,
        report: &mut FlattenReport,
    ) {
        match self.tessellator.tessellate(face, lod) {
            Ok(mesh) => append_mesh(&mesh, transform, unit_scale, buffer, report),
            Err(e) => {
                debug!("Skipping face: {}", e);
                report.failed_faces += 1;
            }
        }
    }
}

/// Append every triangle of a host mesh as three new vertices
fn append_mesh(
    mesh: &TriangleMesh,
    transform: &Transform,
    unit_scale: f64,
    buffer: &mut GeometryBuffer,
    report: &mut FlattenReport,
) {
    for i in 0..mesh.triangle_count() {
        let Some(corners) = mesh.triangle(i) else {
            break;
        };
        let placed = corners.map(|p| transform_point(transform, &p));
        let Some(normal) = triangle_normal(&placed) else {
            report.degenerate_triangles += 1;
            continue;
        };
        buffer.push_triangle(
            placed.map(|p| to_scene_position(&p, unit_scale)),
            to_scene_direction(&normal),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point3, Vector3};
    use approx::assert_relative_eq;
    use famglb_model::{GeometryInstance, PlanarFace, Solid, FEET_TO_METERS};

    fn quad(corners: [[f64; 3]; 4]) -> Face {
        Face::Planar(PlanarFace {
            outer: corners.iter().map(|c| Point3::new(c[0], c[1], c[2])).collect(),
            holes: Vec::new(),
        })
    }

    /// Unit cube with outward-facing loops
    fn unit_cube() -> Solid {
        Solid {
            faces: vec![
                quad([[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
                quad([[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]]),
                quad([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]),
                quad([[0.0, 1.0, 0.0], [0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0]]),
                quad([[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]]),
                quad([[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
            ],
            volume: 1.0,
        }
    }

    fn flatten_at(objects: &[GeometryObject], scale: f64) -> (GeometryBuffer, FlattenReport) {
        let flattener = GeometryFlattener::new(DetailLevel::Medium);
        let mut buffer = GeometryBuffer::new();
        let mut report = FlattenReport::default();
        let identity = Transform::identity();
        flattener.flatten_objects(objects, &identity, scale, &mut buffer, &mut report);
        (buffer, report)
    }

    fn flatten(objects: &[GeometryObject]) -> (GeometryBuffer, FlattenReport) {
        flatten_at(objects, FEET_TO_METERS)
    }

    #[test]
    fn test_meter_cube_at_unit_scale() {
        let cube = unit_cube();

        let mut corners: Vec<Point3<f64>> = Vec::new();
        for face in &cube.faces {
            let Face::Planar(planar) = face else {
                panic!("cube faces are planar");
            };
            for point in &planar.outer {
                if !corners.contains(point) {
                    corners.push(*point);
                }
            }
        }
        assert_eq!(corners.len(), 8);

        let (buffer, report) = flatten_at(&[GeometryObject::Solid(cube)], 1.0);
        assert_eq!(report.skipped(), 0);
        assert_eq!(buffer.indices.len(), 36);
        assert_eq!(buffer.indices.len() / 3, 12);

        let (min, max) = buffer.bounds().unwrap();
        assert_relative_eq!(max[0], 1.0);
        assert_relative_eq!(max[1], 1.0);
        assert_relative_eq!(min[2], -1.0);
    }

    #[test]
    fn test_unit_cube() {
        let (buffer, report) = flatten(&[GeometryObject::Solid(unit_cube())]);

        assert_eq!(buffer.triangle_count(), 12);
        assert_eq!(buffer.indices.len(), 36);
        assert_eq!(buffer.vertex_count(), 36);
        assert_eq!(report.skipped(), 0);
        assert!(buffer.validate().is_ok());
        assert!(buffer.indices.iter().all(|&i| (i as usize) < buffer.vertex_count()));

        let (min, max) = buffer.bounds().unwrap();
        assert_relative_eq!(min[0], 0.0);
        assert_relative_eq!(max[1], 0.3048, epsilon = 1e-6);
        assert_relative_eq!(min[2], -0.3048, epsilon = 1e-6);
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let (buffer, _) = flatten(&[GeometryObject::Solid(unit_cube())]);
        // Cube centre in scene space
        let centre = [0.1524f32, 0.1524, -0.1524];

        for tri in 0..buffer.triangle_count() {
            let [a, b, c] = buffer.triangle_positions(tri).unwrap();
            let centroid: Vec<f32> = (0..3)
                .map(|k| (a[k] + b[k] + c[k]) / 3.0 - centre[k])
                .collect();
            let n = buffer.normals[tri * 3];
            let facing: f32 = (0..3).map(|k| n[k] * centroid[k]).sum();
            assert!(facing > 0.0, "triangle {} faces inward", tri);
            let len: f32 = n.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_zero_volume_solid_is_skipped() {
        let mut solid = unit_cube();
        solid.volume = 0.0;
        let (buffer, report) = flatten(&[GeometryObject::Solid(solid)]);
        assert!(buffer.is_empty());
        assert_eq!(report.degenerate_solids, 1);
    }

    #[test]
    fn test_non_renderable_objects_are_counted() {
        let (buffer, report) = flatten(&[
            GeometryObject::Curve {
                points: vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            },
            GeometryObject::Point {
                position: Point3::origin(),
            },
            GeometryObject::Text {
                content: "Label".to_string(),
            },
        ]);
        assert!(buffer.is_empty());
        assert_eq!(report.non_renderable, 3);
    }

    #[test]
    fn test_nested_instance_transforms_compose() {
        let inner = GeometryInstance {
            transform: Transform::new_translation(&Vector3::new(0.0, 0.0, 2.0)),
            instance_geometry: None,
            symbol_geometry: Some(vec![GeometryObject::Solid(unit_cube())]),
        };
        let outer = GeometryInstance {
            transform: Transform::new_translation(&Vector3::new(10.0, 0.0, 0.0)),
            instance_geometry: Some(vec![GeometryObject::Instance(inner)]),
            symbol_geometry: None,
        };
        let (buffer, _) = flatten(&[GeometryObject::Instance(outer)]);
        assert_eq!(buffer.triangle_count(), 12);

        let (min, max) = buffer.bounds().unwrap();
        assert_relative_eq!(min[0], 10.0 * 0.3048, epsilon = 1e-5);
        assert_relative_eq!(max[0], 11.0 * 0.3048, epsilon = 1e-5);
        // Host Z offset lands on scene Y
        assert_relative_eq!(min[1], 2.0 * 0.3048, epsilon = 1e-5);
    }

    #[test]
    fn test_instance_emits_both_representations() {
        let instance = GeometryInstance {
            transform: Transform::identity(),
            instance_geometry: Some(vec![GeometryObject::Solid(unit_cube())]),
            symbol_geometry: Some(vec![GeometryObject::Solid(unit_cube())]),
        };
        let (buffer, _) = flatten(&[GeometryObject::Instance(instance)]);
        assert_eq!(buffer.triangle_count(), 24);
    }

    #[test]
    fn test_per_triangle_mesh_input() {
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![0, 1, 99],
        );
        let (buffer, _) = flatten(&[GeometryObject::Mesh(mesh)]);
        assert_eq!(buffer.triangle_count(), 2);
        // Host +Z normal becomes scene +Y
        assert_relative_eq!(buffer.normals[0][1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_triangles_are_dropped() {
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            vec![0, 1, 2],
        );
        let (buffer, report) = flatten(&[GeometryObject::Mesh(mesh)]);
        assert!(buffer.is_empty());
        assert_eq!(report.degenerate_triangles, 1);
    }
}
