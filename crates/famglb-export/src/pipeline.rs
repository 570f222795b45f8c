// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Family export pipeline
//!
//! A full export visits every requested configuration inside a transaction
//! that is always rolled back, so the document is left as it was found.
//! The live path ([`export_current`]) exports only the current configuration
//! and never touches transactions.

use crate::collector::ParameterSchema;
use crate::error::{ExportError, Result};
use crate::glb::{write_glb, GlbOutput};
use crate::metadata::FamilyMetadata;
use crate::outcome::ExportOutcome;
use crate::relationships::extract_relationships;
use famglb_geometry::GeometryFlattener;
use famglb_model::{ConfigurationSnapshot, DetailLevel, FamilyDocument};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Export settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub output_folder: PathBuf,
    pub detail_level: DetailLevel,
    /// Export only the current configuration instead of all of them
    pub export_current_type_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_folder: PathBuf::from("."),
            detail_level: DetailLevel::Fine,
            export_current_type_only: false,
        }
    }
}

/// Serialized scene and the number of configurations requested
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedScene {
    pub glb: GlbOutput,
    pub type_count: usize,
}

impl ExportedScene {
    pub fn outcome(&self) -> ExportOutcome {
        ExportOutcome {
            success: true,
            type_count: self.type_count,
            vertex_count: self.glb.vertex_count,
            triangle_count: self.glb.triangle_count,
            byte_size: self.glb.bytes.len(),
            error_message: None,
        }
    }
}

/// Refuse documents that cannot be exported
///
/// Returns the configuration names on success.
pub fn check_preconditions(document: &dyn FamilyDocument) -> Result<Vec<String>> {
    if !document.is_family_document() {
        return Err(ExportError::NotFamilyDocument);
    }
    let types = document.family_manager().types();
    if types.is_empty() {
        return Err(ExportError::NoFamilyTypes);
    }
    Ok(types)
}

/// Multi-configuration exporter
#[derive(Clone, Debug, Default)]
pub struct FamilyExporter {
    options: ExportOptions,
}

impl FamilyExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Path the scene is written to: `<output_folder>/<title>.glb`
    pub fn output_path(&self, document: &dyn FamilyDocument) -> PathBuf {
        self.options.output_folder.join(file_name(document.title()))
    }

    /// Build the scene for the requested configurations
    pub fn export_bytes(&self, document: &mut dyn FamilyDocument) -> Result<ExportedScene> {
        let types = check_preconditions(document)?;
        let requested = if self.options.export_current_type_only {
            let current = document.family_manager().current_type();
            vec![current.unwrap_or_else(|| types[0].clone())]
        } else {
            types
        };

        let schema = ParameterSchema::collect(document.family_manager());
        let (relationships, _) = extract_relationships(document, &schema);
        let flattener = GeometryFlattener::new(self.options.detail_level);

        let mut snapshots = Vec::with_capacity(requested.len());
        for name in &requested {
            let snapshot = snapshot_type(document, &schema, &flattener, name)?;
            if snapshot.geometry.is_empty() {
                debug!("Configuration {} has no geometry; skipping its mesh", name);
            }
            snapshots.push(snapshot);
        }

        let metadata = FamilyMetadata::new(schema.descriptors(), &snapshots, relationships);
        let glb = write_glb(&snapshots, &metadata)?;

        Ok(ExportedScene {
            glb,
            type_count: requested.len(),
        })
    }

    /// Export and write the scene to [`output_path`](Self::output_path)
    pub fn export_to_file(
        &self,
        document: &mut dyn FamilyDocument,
    ) -> Result<(PathBuf, ExportedScene)> {
        let scene = self.export_bytes(document)?;
        let path = self.output_path(document);
        write_file(&path, &scene.glb.bytes)?;

        info!(
            "Exported {} ({} types, {} vertices, {} triangles) to {}",
            document.title(),
            scene.type_count,
            scene.glb.vertex_count,
            scene.glb.triangle_count,
            path.display()
        );
        Ok((path, scene))
    }

    /// Export to file, folding every error into the outcome
    pub fn export(&self, document: &mut dyn FamilyDocument) -> ExportOutcome {
        match self.export_to_file(document) {
            Ok((_, scene)) => scene.outcome(),
            Err(e) => ExportOutcome::failure(e.to_string()),
        }
    }
}

/// Snapshot one configuration inside a rolled-back transaction
fn snapshot_type(
    document: &mut dyn FamilyDocument,
    schema: &ParameterSchema,
    flattener: &GeometryFlattener,
    name: &str,
) -> Result<ConfigurationSnapshot> {
    document.start_transaction(&format!("Export {}", name))?;

    let result = (|| -> Result<ConfigurationSnapshot> {
        document.family_manager_mut().set_current_type(name)?;
        document.regenerate()?;

        let mut snapshot = ConfigurationSnapshot::new(name);
        snapshot.values = schema.collect_values(document.family_manager());
        let (geometry, report) = flattener.flatten(&*document);
        if report.skipped() > 0 {
            debug!("Configuration {}: {:?}", name, report);
        }
        snapshot.geometry = geometry;
        Ok(snapshot)
    })();

    let rollback = document.rollback_transaction();
    let snapshot = result?;
    rollback?;
    Ok(snapshot)
}

/// Export the current configuration only, without transactions
///
/// This is the live path used after client values have been applied.
pub fn export_current(
    document: &dyn FamilyDocument,
    detail_level: DetailLevel,
) -> Result<ExportedScene> {
    if !document.is_family_document() {
        return Err(ExportError::NotFamilyDocument);
    }

    let schema = ParameterSchema::collect(document.family_manager());
    let name = document
        .family_manager()
        .current_type()
        .unwrap_or_else(|| document.title().to_string());

    let mut snapshot = ConfigurationSnapshot::new(name);
    snapshot.values = schema.collect_values(document.family_manager());
    let (geometry, _) = GeometryFlattener::new(detail_level).flatten(document);
    snapshot.geometry = geometry;

    let (relationships, _) = extract_relationships(document, &schema);
    let snapshots = [snapshot];
    let metadata = FamilyMetadata::new(schema.descriptors(), &snapshots, relationships);
    let glb = write_glb(&snapshots, &metadata)?;

    Ok(ExportedScene { glb, type_count: 1 })
}

fn file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}.glb", stem)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Single Flush Door"), "Single Flush Door.glb");
        assert_eq!(file_name("a/b"), "a_b.glb");
    }

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.detail_level, DetailLevel::Fine);
        assert!(!options.export_current_type_only);

        let json = r#"{ "output_folder": "out", "detail_level": "coarse" }"#;
        let parsed: ExportOptions = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.output_folder, PathBuf::from("out"));
        assert_eq!(parsed.detail_level, DetailLevel::Coarse);
    }
}
