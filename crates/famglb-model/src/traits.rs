// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host document traits
//!
//! A host application exposes its open family through these traits. The
//! export pipeline only ever sees `dyn` trait objects, so any host (or the
//! in-memory document used by tests and the CLI) can drive it.

use crate::{
    DimensionRecord, ElementId, ElementRecord, FamilyParameter, GeometryObject, GeometryOptions,
    GeometryReference, ParamValue, Result, View3D, FEET_TO_METERS,
};

/// Parameter definitions, configurations and values of a family
///
/// Values are always read from and written to the current configuration.
/// Mutating methods require an open transaction on the owning document.
///
/// # Example
///
/// ```ignore
/// use famglb_model::FamilyManager;
///
/// fn list_types(manager: &dyn FamilyManager) {
///     for name in manager.types() {
///         println!("{}", name);
///     }
/// }
/// ```
pub trait FamilyManager {
    /// All parameter definitions, in host order
    fn parameters(&self) -> Vec<FamilyParameter>;

    /// Look up a definition by name (case-insensitive)
    fn parameter(&self, name: &str) -> Option<FamilyParameter> {
        self.parameters()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Typed data-type identifier of a definition
    ///
    /// `Ok(None)` means the host has no typed identifier for it; `Err` means
    /// the lookup itself failed.
    fn data_type(&self, parameter: &FamilyParameter) -> Result<Option<String>>;

    /// Configuration names, in host order
    fn types(&self) -> Vec<String>;

    /// Name of the current configuration
    fn current_type(&self) -> Option<String>;

    /// Value of a parameter in the current configuration, if it has one
    fn value(&self, parameter: ElementId) -> Option<ParamValue>;

    /// Make `name` the current configuration
    fn set_current_type(&mut self, name: &str) -> Result<()>;

    /// Set a parameter value in the current configuration
    ///
    /// Double lengths are in host units (feet).
    fn set_value(&mut self, parameter: ElementId, value: ParamValue) -> Result<()>;
}

/// Read access to elements and their geometry
pub trait ElementCollector {
    /// Every element in the document
    fn elements(&self) -> Vec<ElementRecord>;

    /// Resolved geometry tree of an element, `None` if it has no geometry
    fn element_geometry(&self, id: ElementId, options: &GeometryOptions)
        -> Option<Vec<GeometryObject>>;

    /// All 3D views
    fn views_3d(&self) -> Vec<View3D>;

    /// Elements visible in a view
    fn visible_elements(&self, view: ElementId) -> Vec<ElementId>;

    /// All dimension annotations
    fn dimensions(&self) -> Vec<DimensionRecord>;

    /// Convert a reference to its stable, serializable token
    fn stable_representation(&self, reference: &GeometryReference) -> Result<String>;
}

/// An open host document
///
/// Implementations are owned by exactly one thread at a time; `Send` lets the
/// bridge move the document onto its mutation-authority thread.
pub trait FamilyDocument: Send {
    /// Document title
    fn title(&self) -> &str;

    /// Whether this is a family (as opposed to a project) document
    fn is_family_document(&self) -> bool;

    /// Parameter and configuration access
    fn family_manager(&self) -> &dyn FamilyManager;

    /// Mutable parameter and configuration access
    fn family_manager_mut(&mut self) -> &mut dyn FamilyManager;

    /// Element and geometry access
    fn collector(&self) -> &dyn ElementCollector;

    /// Open a named transaction; nested transactions are rejected
    fn start_transaction(&mut self, name: &str) -> Result<()>;

    /// Commit the open transaction
    fn commit_transaction(&mut self) -> Result<()>;

    /// Discard every change made since the transaction opened
    fn rollback_transaction(&mut self) -> Result<()>;

    /// Whether a transaction is open
    fn has_open_transaction(&self) -> bool;

    /// Recompute formulas and geometry after parameter changes
    fn regenerate(&mut self) -> Result<()>;

    /// Scale from internal length units to meters
    fn unit_scale(&self) -> f64 {
        FEET_TO_METERS
    }
}
