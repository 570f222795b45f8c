// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MemoryDocument - in-memory family document implementation

use crate::description::{DocumentDescription, ElementDescription, Extent, ParametricBox};
use famglb_model::{
    DimensionRecord, ElementCollector, ElementId, ElementRecord, Face, FamilyDocument,
    FamilyManager, FamilyParameter, GeometryObject, GeometryOptions, GeometryReference,
    ModelError, ParamValue, PlanarFace, Result, Solid, View3D,
};
use log::debug;
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::Path;

/// Parameter values of every configuration plus the current selection
///
/// This is the state a transaction snapshots and restores.
#[derive(Clone, Debug, PartialEq)]
struct ValueState {
    types: Vec<(String, BTreeMap<String, ParamValue>)>,
    current: usize,
}

/// What a rollback restores: values plus the geometry regenerated from them
struct Snapshot {
    values: ValueState,
    generated: FxHashMap<ElementId, GeometryObject>,
}

/// Parameters and configurations of a [`MemoryDocument`]
pub struct MemoryFamilyManager {
    parameters: Vec<FamilyParameter>,
    data_types: BTreeMap<String, String>,
    failing_data_types: Vec<String>,
    state: ValueState,
    in_transaction: bool,
}

impl MemoryFamilyManager {
    fn require_transaction(&self, operation: &str) -> Result<()> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(ModelError::transaction(format!(
                "{} requires an open transaction",
                operation
            )))
        }
    }

    fn definition(&self, id: ElementId) -> Result<&FamilyParameter> {
        self.parameters
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ModelError::ParameterNotFound(id.to_string()))
    }

    fn current_values(&self) -> Option<&BTreeMap<String, ParamValue>> {
        self.state.types.get(self.state.current).map(|(_, values)| values)
    }

    /// Value of a parameter by name in the current configuration
    pub fn value_by_name(&self, name: &str) -> Option<&ParamValue> {
        let values = self.current_values()?;
        values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

impl FamilyManager for MemoryFamilyManager {
    fn parameters(&self) -> Vec<FamilyParameter> {
        self.parameters.clone()
    }

    fn data_type(&self, parameter: &FamilyParameter) -> Result<Option<String>> {
        if self
            .failing_data_types
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&parameter.name))
        {
            return Err(ModelError::DataTypeLookup {
                parameter: parameter.name.clone(),
                message: "definition has no typed identifier".to_string(),
            });
        }
        Ok(self.data_types.get(&parameter.name).cloned())
    }

    fn types(&self) -> Vec<String> {
        self.state.types.iter().map(|(name, _)| name.clone()).collect()
    }

    fn current_type(&self) -> Option<String> {
        self.state
            .types
            .get(self.state.current)
            .map(|(name, _)| name.clone())
    }

    fn value(&self, parameter: ElementId) -> Option<ParamValue> {
        let definition = self.parameters.iter().find(|p| p.id == parameter)?;
        self.current_values()?.get(&definition.name).cloned()
    }

    fn set_current_type(&mut self, name: &str) -> Result<()> {
        self.require_transaction("Changing the current type")?;
        let index = self
            .state
            .types
            .iter()
            .position(|(type_name, _)| type_name == name)
            .ok_or_else(|| ModelError::TypeNotFound(name.to_string()))?;
        self.state.current = index;
        Ok(())
    }

    fn set_value(&mut self, parameter: ElementId, value: ParamValue) -> Result<()> {
        self.require_transaction("Setting a parameter")?;
        let definition = self.definition(parameter)?;
        if definition.is_reporting {
            return Err(ModelError::ReportingParameter(definition.name.clone()));
        }
        if value.kind() != definition.storage_kind {
            return Err(ModelError::type_mismatch(
                definition.name.clone(),
                definition.storage_kind,
                value.kind().to_string(),
            ));
        }

        let name = definition.name.clone();
        let current = self.state.current;
        let (_, values) = self
            .state
            .types
            .get_mut(current)
            .ok_or_else(|| ModelError::transaction("document has no family types"))?;
        values.insert(name, value);
        Ok(())
    }
}

/// Elements, views and dimensions of a [`MemoryDocument`]
pub struct MemoryCollector {
    elements: Vec<ElementDescription>,
    views: Vec<(View3D, Vec<ElementId>)>,
    dimensions: Vec<DimensionRecord>,
    /// Geometry rebuilt from parameter values on regeneration
    generated: FxHashMap<ElementId, GeometryObject>,
}

impl MemoryCollector {
    fn element(&self, id: ElementId) -> Option<&ElementDescription> {
        self.elements.iter().find(|e| e.record.id == id)
    }
}

impl ElementCollector for MemoryCollector {
    fn elements(&self) -> Vec<ElementRecord> {
        self.elements.iter().map(|e| e.record.clone()).collect()
    }

    fn element_geometry(
        &self,
        id: ElementId,
        options: &GeometryOptions,
    ) -> Option<Vec<GeometryObject>> {
        let element = self.element(id)?;
        if let Some(view) = options.view {
            let visible = self
                .views
                .iter()
                .find(|(v, _)| v.id == view)
                .is_some_and(|(_, ids)| ids.contains(&id));
            if !visible && !options.include_non_visible {
                return None;
            }
        }

        let mut objects = element.geometry.clone();
        if let Some(generated) = self.generated.get(&id) {
            objects.push(generated.clone());
        }
        (!objects.is_empty()).then_some(objects)
    }

    fn views_3d(&self) -> Vec<View3D> {
        self.views.iter().map(|(view, _)| view.clone()).collect()
    }

    fn visible_elements(&self, view: ElementId) -> Vec<ElementId> {
        self.views
            .iter()
            .find(|(v, _)| v.id == view)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default()
    }

    fn dimensions(&self) -> Vec<DimensionRecord> {
        self.dimensions.clone()
    }

    fn stable_representation(&self, reference: &GeometryReference) -> Result<String> {
        if self.element(reference.element).is_none() {
            return Err(ModelError::reference(format!(
                "element {} does not exist",
                reference.element
            )));
        }
        if reference.kind.trim().is_empty() {
            return Err(ModelError::reference(format!(
                "reference {}:{} has no kind",
                reference.element, reference.index
            )));
        }
        Ok(format!(
            "{}:{}:{}",
            reference.element, reference.index, reference.kind
        ))
    }
}

/// In-memory host document
///
/// Loaded from a JSON [`DocumentDescription`]. Parameter changes happen inside
/// transactions and are discarded on rollback; [`regenerate`] rebuilds every
/// parametric box from the current configuration.
///
/// [`regenerate`]: FamilyDocument::regenerate
pub struct MemoryDocument {
    title: String,
    is_family: bool,
    manager: MemoryFamilyManager,
    collector: MemoryCollector,
    transaction: Option<(String, Snapshot)>,
    regenerations: usize,
}

impl MemoryDocument {
    /// Build a document from its description and regenerate it once
    pub fn from_description(description: DocumentDescription) -> Result<Self> {
        let DocumentDescription {
            title,
            is_family_document,
            parameters,
            data_types,
            failing_data_types,
            types,
            current_type,
            elements,
            views,
            dimensions,
        } = description;

        let mut state_types = Vec::with_capacity(types.len());
        for type_description in types {
            let mut values = BTreeMap::new();
            for (name, raw) in &type_description.values {
                let definition = parameters
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| {
                        ModelError::invalid_document(format!(
                            "type '{}' sets unknown parameter '{}'",
                            type_description.name, name
                        ))
                    })?;
                let value = ParamValue::from_json(&definition.name, raw, definition.storage_kind)?;
                values.insert(definition.name.clone(), value);
            }
            state_types.push((type_description.name, values));
        }

        let current = match current_type {
            Some(name) => state_types
                .iter()
                .position(|(type_name, _)| *type_name == name)
                .ok_or(ModelError::TypeNotFound(name))?,
            None => 0,
        };

        let mut document = Self {
            title,
            is_family: is_family_document,
            manager: MemoryFamilyManager {
                parameters,
                data_types,
                failing_data_types,
                state: ValueState {
                    types: state_types,
                    current,
                },
                in_transaction: false,
            },
            collector: MemoryCollector {
                elements,
                views: views
                    .into_iter()
                    .map(|v| (v.view, v.visible_elements))
                    .collect(),
                dimensions,
                generated: FxHashMap::default(),
            },
            transaction: None,
            regenerations: 0,
        };
        document.regenerate()?;
        Ok(document)
    }

    /// Parse a JSON document description
    pub fn from_json_str(content: &str) -> Result<Self> {
        let description: DocumentDescription = serde_json::from_str(content)?;
        Self::from_description(description)
    }

    /// Read a JSON document description from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Number of regenerations since load (including the initial one)
    pub fn regenerations(&self) -> usize {
        self.regenerations
    }

    /// Concrete access to the family manager
    pub fn manager(&self) -> &MemoryFamilyManager {
        &self.manager
    }

    fn extent(&self, extent: &Extent) -> Result<f64> {
        match extent {
            Extent::Fixed(value) => Ok(*value),
            Extent::Parameter(name) => self
                .manager
                .value_by_name(name)
                .and_then(ParamValue::as_f64)
                .ok_or_else(|| ModelError::ParameterNotFound(name.clone())),
        }
    }

    fn build_box(&self, shape: &ParametricBox) -> Result<Solid> {
        let width = self.extent(&shape.width)?;
        let depth = self.extent(&shape.depth)?;
        let height = self.extent(&shape.height)?;
        Ok(box_solid(shape.origin, width, depth, height))
    }
}

/// Axis-aligned box with outward-wound faces
pub fn box_solid(origin: Point3<f64>, width: f64, depth: f64, height: f64) -> Solid {
    let corner = |x: f64, y: f64, z: f64| {
        Point3::new(origin.x + x * width, origin.y + y * depth, origin.z + z * height)
    };
    let face = |points: [(f64, f64, f64); 4]| {
        Face::Planar(PlanarFace {
            outer: points.iter().map(|&(x, y, z)| corner(x, y, z)).collect(),
            holes: Vec::new(),
        })
    };

    Solid {
        faces: vec![
            face([(0., 0., 0.), (0., 1., 0.), (1., 1., 0.), (1., 0., 0.)]),
            face([(0., 0., 1.), (1., 0., 1.), (1., 1., 1.), (0., 1., 1.)]),
            face([(0., 0., 0.), (1., 0., 0.), (1., 0., 1.), (0., 0., 1.)]),
            face([(0., 1., 0.), (0., 1., 1.), (1., 1., 1.), (1., 1., 0.)]),
            face([(0., 0., 0.), (0., 0., 1.), (0., 1., 1.), (0., 1., 0.)]),
            face([(1., 0., 0.), (1., 1., 0.), (1., 1., 1.), (1., 0., 1.)]),
        ],
        volume: (width * depth * height).abs(),
    }
}

impl FamilyDocument for MemoryDocument {
    fn title(&self) -> &str {
        &self.title
    }

    fn is_family_document(&self) -> bool {
        self.is_family
    }

    fn family_manager(&self) -> &dyn FamilyManager {
        &self.manager
    }

    fn family_manager_mut(&mut self) -> &mut dyn FamilyManager {
        &mut self.manager
    }

    fn collector(&self) -> &dyn ElementCollector {
        &self.collector
    }

    fn start_transaction(&mut self, name: &str) -> Result<()> {
        if let Some((open, _)) = &self.transaction {
            return Err(ModelError::transaction(format!(
                "cannot start '{}' while '{}' is open",
                name, open
            )));
        }
        let snapshot = Snapshot {
            values: self.manager.state.clone(),
            generated: self.collector.generated.clone(),
        };
        self.transaction = Some((name.to_string(), snapshot));
        self.manager.in_transaction = true;
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        let (name, _) = self
            .transaction
            .take()
            .ok_or_else(|| ModelError::transaction("no open transaction to commit"))?;
        self.manager.in_transaction = false;
        debug!("Committed transaction '{}'", name);
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        let (name, snapshot) = self
            .transaction
            .take()
            .ok_or_else(|| ModelError::transaction("no open transaction to roll back"))?;
        self.manager.state = snapshot.values;
        self.collector.generated = snapshot.generated;
        self.manager.in_transaction = false;
        debug!("Rolled back transaction '{}'", name);
        Ok(())
    }

    fn has_open_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn regenerate(&mut self) -> Result<()> {
        let mut generated = FxHashMap::default();
        for element in &self.collector.elements {
            if let Some(shape) = &element.parametric_box {
                let solid = self.build_box(shape)?;
                generated.insert(element.record.id, GeometryObject::Solid(solid));
            }
        }
        self.collector.generated = generated;
        self.regenerations += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SAMPLE_FAMILY;
    use approx::assert_relative_eq;
    use famglb_model::StorageKind;

    fn sample() -> MemoryDocument {
        MemoryDocument::from_json_str(SAMPLE_FAMILY).unwrap()
    }

    fn parameter_id(doc: &MemoryDocument, name: &str) -> ElementId {
        doc.family_manager().parameter(name).unwrap().id
    }

    #[test]
    fn test_load_sample() {
        let doc = sample();
        assert!(doc.is_family_document());
        assert_eq!(doc.regenerations(), 1);

        let manager = doc.family_manager();
        assert_eq!(manager.types(), vec!["915 x 2134", "813 x 2032"]);
        assert_eq!(manager.current_type().as_deref(), Some("915 x 2134"));

        let width = manager.value(parameter_id(&doc, "Width")).unwrap();
        assert_eq!(width, ParamValue::Float(3.0));
        let material = manager.value(parameter_id(&doc, "Material")).unwrap();
        assert_eq!(material.kind(), StorageKind::ElementId);
    }

    #[test]
    fn test_set_value_requires_transaction() {
        let mut doc = sample();
        let id = parameter_id(&doc, "Width");
        let err = doc
            .family_manager_mut()
            .set_value(id, ParamValue::Float(4.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::Transaction(_)));
    }

    #[test]
    fn test_rollback_restores_values() {
        let mut doc = sample();
        let id = parameter_id(&doc, "Width");

        doc.start_transaction("edit").unwrap();
        doc.family_manager_mut()
            .set_value(id, ParamValue::Float(4.0))
            .unwrap();
        doc.family_manager_mut().set_current_type("813 x 2032").unwrap();
        doc.rollback_transaction().unwrap();

        assert_eq!(doc.family_manager().value(id), Some(ParamValue::Float(3.0)));
        assert_eq!(doc.family_manager().current_type().as_deref(), Some("915 x 2134"));
        assert!(!doc.has_open_transaction());
    }

    #[test]
    fn test_rollback_restores_geometry() {
        let mut doc = sample();
        let options = GeometryOptions::for_detail(Default::default());
        let before = doc.collector().element_geometry(ElementId(100), &options);

        doc.start_transaction("switch").unwrap();
        doc.family_manager_mut().set_current_type("813 x 2032").unwrap();
        doc.regenerate().unwrap();
        assert_ne!(doc.collector().element_geometry(ElementId(100), &options), before);
        doc.rollback_transaction().unwrap();

        assert_eq!(doc.collector().element_geometry(ElementId(100), &options), before);
    }

    #[test]
    fn test_nested_transaction_is_rejected() {
        let mut doc = sample();
        doc.start_transaction("outer").unwrap();
        assert!(doc.start_transaction("inner").is_err());
        doc.commit_transaction().unwrap();
        assert!(doc.commit_transaction().is_err());
    }

    #[test]
    fn test_set_value_checks_definition() {
        let mut doc = sample();
        doc.start_transaction("edit").unwrap();

        let area = parameter_id(&doc, "Area");
        let err = doc
            .family_manager_mut()
            .set_value(area, ParamValue::Float(1.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::ReportingParameter(_)));

        let width = parameter_id(&doc, "Width");
        let err = doc
            .family_manager_mut()
            .set_value(width, ParamValue::Text("wide".to_string()))
            .unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));
    }

    #[test]
    fn test_regenerate_follows_parameters() {
        let mut doc = sample();
        let id = parameter_id(&doc, "Width");
        let options = GeometryOptions::for_detail(Default::default());

        doc.start_transaction("widen").unwrap();
        doc.family_manager_mut()
            .set_value(id, ParamValue::Float(4.0))
            .unwrap();
        doc.commit_transaction().unwrap();
        doc.regenerate().unwrap();

        let objects = doc.collector().element_geometry(ElementId(100), &options).unwrap();
        let GeometryObject::Solid(solid) = objects.last().unwrap() else {
            panic!("expected a solid");
        };
        // Width 4 ft, thickness 0.25 ft, height 7 ft
        assert_relative_eq!(solid.volume, 4.0 * 0.25 * 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_data_type_lookup() {
        let doc = sample();
        let manager = doc.family_manager();
        let width = manager.parameter("width").unwrap();
        assert_eq!(
            manager.data_type(&width).unwrap().as_deref(),
            Some("autodesk.spec.aec:length-2.0.0")
        );
        let mark = manager.parameter("Mark").unwrap();
        assert!(manager.data_type(&mark).unwrap().is_none());
        let fire = manager.parameter("Fire Rating").unwrap();
        assert!(manager.data_type(&fire).is_err());
    }

    #[test]
    fn test_stable_representation() {
        let doc = sample();
        let collector = doc.collector();
        let good = GeometryReference {
            element: ElementId(100),
            index: 3,
            kind: "SURFACE".to_string(),
        };
        assert_eq!(collector.stable_representation(&good).unwrap(), "100:3:SURFACE");

        let missing = GeometryReference {
            element: ElementId(999),
            index: 0,
            kind: "SURFACE".to_string(),
        };
        assert!(collector.stable_representation(&missing).is_err());
    }

    #[test]
    fn test_unknown_parameter_in_type_is_rejected() {
        let json = r#"{
            "title": "Broken",
            "types": [{"name": "A", "values": {"Nope": 1}}]
        }"#;
        assert!(matches!(
            MemoryDocument::from_json_str(json),
            Err(ModelError::InvalidDocument(_))
        ));
    }
}
