// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter relationship extraction
//!
//! Builds the dependency and target graph once per export pass:
//!
//! - dependencies come from identifiers in each parameter's formula
//! - dimension targets come from dimensions labelled with the parameter
//! - element targets come from elements exposing a parameter of the same name

use crate::collector::ParameterSchema;
use crate::formula;
use famglb_model::{
    DimensionRecord, ElementCollector, ElementId, FamilyDocument, ParameterRelationship,
    RelationshipTarget, TargetKind,
};
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

/// Counts of references that could not be converted
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationshipReport {
    pub failed_references: usize,
}

/// Extract one relationship per distinct parameter name
///
/// Names are compared case-insensitively; the first entry with a given name
/// wins and blank names are skipped.
pub fn extract_relationships(
    document: &dyn FamilyDocument,
    schema: &ParameterSchema,
) -> (Vec<ParameterRelationship>, RelationshipReport) {
    let collector = document.collector();
    let mut report = RelationshipReport::default();
    let mut relationships = Vec::new();
    let mut index_by_name: FxHashMap<String, usize> = FxHashMap::default();
    // Every definition maps to its name's relationship, including later
    // definitions whose name differs only in case
    let mut index_by_id: FxHashMap<ElementId, usize> = FxHashMap::default();

    let is_known = |word: &str| schema.get(word).is_some();

    for entry in schema.entries() {
        let name = entry.descriptor.name.trim();
        if name.is_empty() {
            continue;
        }
        let key = name.to_lowercase();
        if let Some(&index) = index_by_name.get(&key) {
            index_by_id.insert(entry.parameter.id, index);
            continue;
        }

        let mut relationship = ParameterRelationship::new(entry.descriptor.name.clone());
        relationship.formula = entry.descriptor.formula.clone();
        relationship.is_reporting = entry.descriptor.is_reporting;
        if let Some(text) = &entry.descriptor.formula {
            relationship.dependencies = formula::dependencies(text, is_known);
        }

        index_by_id.insert(entry.parameter.id, relationships.len());
        index_by_name.insert(key, relationships.len());
        relationships.push(relationship);
    }

    for dimension in collector.dimensions() {
        let Some(&index) = dimension.label.and_then(|label| index_by_id.get(&label)) else {
            continue;
        };
        let target = dimension_target(collector, &dimension, &mut report);
        relationships[index].targets.push(target);
    }

    for element in collector.elements() {
        if element.is_element_type {
            continue;
        }
        let element_id = element.id.to_string();
        let mut exposed = FxHashSet::default();

        for parameter_name in &element.parameter_names {
            let key = parameter_name.to_lowercase();
            if !exposed.insert(key.clone()) {
                continue;
            }
            let Some(&index) = index_by_name.get(&key) else {
                continue;
            };
            let relationship = &mut relationships[index];
            if relationship.has_target(&element_id, TargetKind::ElementParameter) {
                continue;
            }
            relationship.targets.push(RelationshipTarget {
                element_id: element_id.clone(),
                category: element.category.name.clone(),
                geometry_type: TargetKind::ElementParameter,
                reference_stable_representation: None,
            });
        }
    }

    debug!(
        "Extracted {} relationships ({} unconvertible references)",
        relationships.len(),
        report.failed_references
    );

    (relationships, report)
}

fn dimension_target(
    collector: &dyn ElementCollector,
    dimension: &DimensionRecord,
    report: &mut RelationshipReport,
) -> RelationshipTarget {
    let mut representations = Vec::with_capacity(dimension.references.len());

    for reference in &dimension.references {
        match collector.stable_representation(reference) {
            Ok(token) => representations.push(token),
            Err(e) => {
                warn!("Dimension {}: {}", dimension.id, e);
                report.failed_references += 1;
            }
        }
    }

    RelationshipTarget {
        element_id: dimension.id.to_string(),
        category: dimension.category.clone(),
        geometry_type: TargetKind::Dimension,
        reference_stable_representation: if representations.is_empty() {
            None
        } else {
            Some(representations.join(";"))
        },
    }
}
