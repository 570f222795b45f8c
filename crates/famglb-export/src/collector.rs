// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter schema and value collection
//!
//! The schema is read once per export pass. Values are read per
//! configuration and normalized to meters for length parameters.

use famglb_model::{
    feet_to_meters, is_length_parameter, json_type_name, meters_to_feet, ElementId,
    FamilyManager, FamilyParameter, ModelError, ParamValue, ParameterDescriptor, StorageKind,
};
use log::warn;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// One schema entry: the host definition and its descriptor
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaEntry {
    pub parameter: FamilyParameter,
    pub descriptor: ParameterDescriptor,
}

impl SchemaEntry {
    /// Whether a `Double` value of this parameter is a length
    pub fn is_length(&self) -> bool {
        self.parameter.storage_kind == StorageKind::Double
            && is_length_parameter(&self.descriptor.name, &self.descriptor.data_type)
    }

    /// Host value as written to the scene file
    ///
    /// Length doubles are converted from feet to meters.
    pub fn export_value(&self, value: ParamValue) -> ParamValue {
        match value {
            ParamValue::Float(v) if self.is_length() => ParamValue::Float(feet_to_meters(v)),
            other => other,
        }
    }

    /// Convert a client-supplied JSON value into a host value
    ///
    /// Clients send lengths in meters; they are converted back to feet.
    pub fn host_value(&self, value: &serde_json::Value) -> famglb_model::Result<ParamValue> {
        let parsed =
            ParamValue::from_json(&self.descriptor.name, value, self.parameter.storage_kind)?;
        Ok(match parsed {
            ParamValue::Float(v) if self.is_length() => ParamValue::Float(meters_to_feet(v)),
            other => other,
        })
    }
}

/// Parameter schema of a family, with case-insensitive name lookup
#[derive(Clone, Debug, Default)]
pub struct ParameterSchema {
    entries: Vec<SchemaEntry>,
    by_name: FxHashMap<String, usize>,
}

impl ParameterSchema {
    /// Read every parameter definition from the host
    ///
    /// The data-type tag falls back to the storage kind name when the host has
    /// no typed identifier or the lookup fails.
    pub fn collect(manager: &dyn FamilyManager) -> Self {
        let mut schema = Self::default();

        for parameter in manager.parameters() {
            let data_type = match manager.data_type(&parameter) {
                Ok(Some(tag)) => tag,
                Ok(None) => parameter.storage_kind.to_string(),
                Err(e) => {
                    warn!("{}; using storage kind", e);
                    parameter.storage_kind.to_string()
                }
            };

            let descriptor = ParameterDescriptor {
                name: parameter.name.clone(),
                is_instance: parameter.is_instance,
                is_reporting: parameter.is_reporting,
                is_shared: parameter.is_shared,
                storage_type: parameter.storage_kind,
                data_type,
                formula: parameter.formula.clone(),
                guid: if parameter.is_shared {
                    parameter.guid.clone()
                } else {
                    None
                },
            };
            schema.push(SchemaEntry {
                parameter,
                descriptor,
            });
        }

        schema
    }

    fn push(&mut self, entry: SchemaEntry) {
        let key = entry.descriptor.name.to_lowercase();
        let index = self.entries.len();
        self.entries.push(entry);
        self.by_name.entry(key).or_insert(index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in host order
    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// First entry with this name, ignoring case
    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| &self.entries[index])
    }

    /// Descriptors in host order
    pub fn descriptors(&self) -> Vec<ParameterDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Values of the current configuration, normalized for export
    ///
    /// Missing values default by storage kind: `0.0`, `0`, absent for text,
    /// `-1` for element references.
    pub fn collect_values(&self, manager: &dyn FamilyManager) -> BTreeMap<String, ParamValue> {
        let mut values = BTreeMap::new();

        for entry in &self.entries {
            let value = match (manager.value(entry.parameter.id), entry.parameter.storage_kind) {
                (Some(value), _) => value,
                (None, StorageKind::Double) => ParamValue::Float(0.0),
                (None, StorageKind::Integer) => ParamValue::Integer(0),
                (None, StorageKind::String) => continue,
                (None, StorageKind::ElementId) => {
                    ParamValue::EntityRef(ElementId::INVALID.into())
                }
            };
            values.insert(entry.descriptor.name.clone(), entry.export_value(value));
        }

        values
    }
}

/// Why a client-supplied value was not applied
#[derive(Debug)]
pub enum RejectedValue {
    /// No parameter with that name
    Unknown,
    /// Reporting parameters are never set
    Reporting,
    /// Value does not fit the storage kind, or the host refused it
    Invalid(ModelError),
}

/// Apply client-supplied values to the current configuration
///
/// Reporting parameters are skipped. Type mismatches and host rejections are
/// logged and skipped; the remaining values are still applied. Returns the
/// number of values applied.
pub fn apply_values<'a>(
    manager: &mut dyn FamilyManager,
    schema: &ParameterSchema,
    values: impl IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
) -> (usize, Vec<(String, RejectedValue)>) {
    let mut applied = 0;
    let mut rejected = Vec::new();

    for (name, raw) in values {
        let Some(entry) = schema.get(name) else {
            warn!("Ignoring unknown parameter {}", name);
            rejected.push((name.clone(), RejectedValue::Unknown));
            continue;
        };
        if entry.parameter.is_reporting {
            rejected.push((name.clone(), RejectedValue::Reporting));
            continue;
        }

        let result = entry
            .host_value(raw)
            .and_then(|value| manager.set_value(entry.parameter.id, value));
        match result {
            Ok(()) => applied += 1,
            Err(e) => {
                warn!(
                    "Failed to set parameter {} from {} value: {}",
                    name,
                    json_type_name(raw),
                    e
                );
                rejected.push((name.clone(), RejectedValue::Invalid(e)));
            }
        }
    }

    (applied, rejected)
}
