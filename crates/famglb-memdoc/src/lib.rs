// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # famglb In-Memory Document
//!
//! A complete [`FamilyDocument`](famglb_model::FamilyDocument) implementation
//! backed by a JSON description. It has parameters, configurations,
//! transactions with rollback, parametric geometry rebuilt on regeneration,
//! 3D views and labelled dimensions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use famglb_memdoc::MemoryDocument;
//! use famglb_model::FamilyDocument;
//!
//! let doc = MemoryDocument::from_path("door.json")?;
//! println!("{}: {} types", doc.title(), doc.family_manager().types().len());
//! ```

pub mod description;
pub mod document;

pub use description::{
    DocumentDescription, ElementDescription, Extent, ParametricBox, TypeDescription,
    ViewDescription,
};
pub use document::{box_solid, MemoryCollector, MemoryDocument, MemoryFamilyManager};

/// A door family with two types, labelled dimensions and mixed geometry
pub const SAMPLE_FAMILY: &str = include_str!("../fixtures/sample_family.json");

impl MemoryDocument {
    /// Load [`SAMPLE_FAMILY`]
    pub fn sample() -> famglb_model::Result<Self> {
        Self::from_json_str(SAMPLE_FAMILY)
    }
}
