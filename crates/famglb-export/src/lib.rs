// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # famglb Export
//!
//! Turns a parametric family into one GLB file: a mesh per configuration
//! plus a metadata payload describing parameters, values and the
//! relationships between them.
//!
//! ## Overview
//!
//! - **Collector**: parameter schema and per-configuration values in meters
//! - **Relationships**: formula dependencies, dimension and element targets
//! - **GLB**: glTF document, binary buffer and container framing
//! - **Pipeline**: preconditions, the per-configuration loop and file output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use famglb_export::{ExportOptions, FamilyExporter};
//!
//! let exporter = FamilyExporter::new(ExportOptions::default());
//! let outcome = exporter.export(&mut document);
//! println!("{}", outcome);
//! ```

pub mod collector;
pub mod error;
pub mod formula;
pub mod glb;
pub mod metadata;
pub mod outcome;
pub mod pipeline;
pub mod relationships;

pub use collector::{apply_values, ParameterSchema, RejectedValue, SchemaEntry};
pub use error::{ExportError, Result};
pub use glb::{assemble_glb, read_glb, split_glb, write_glb, GlbOutput};
pub use metadata::{
    metadata_json, read_asset_metadata, read_metadata, FamilyMetadata, TypeValues, Units,
    METADATA_KEY,
};
pub use outcome::ExportOutcome;
pub use pipeline::{
    check_preconditions, export_current, ExportOptions, ExportedScene, FamilyExporter,
};
pub use relationships::{extract_relationships, RelationshipReport};
