// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! famglb Model - Shared types and host-document traits
//!
//! This crate provides the core abstractions for exporting a parametric family
//! out of a host modeling application. It defines the traits a host document
//! implements and the data types that flow through the export pipeline, so the
//! geometry, export and bridge crates never depend on a concrete host.
//!
//! # Architecture
//!
//! - [`FamilyDocument`] - Entry point: the open document and its transactions
//! - [`FamilyManager`] - Parameter definitions, configurations and values
//! - [`ElementCollector`] - Elements, their geometry, 3D views and dimensions
//!
//! Data produced per export pass:
//!
//! - [`ParameterDescriptor`] - one schema entry per parameter
//! - [`ConfigurationSnapshot`] - values and geometry of one family type
//! - [`ParameterRelationship`] - dependency and target graph entry
//! - [`GeometryBuffer`] - flattened triangle soup in meters, Y-up
//!
//! # Example
//!
//! ```ignore
//! use famglb_model::{FamilyDocument, GeometryOptions, DetailLevel};
//!
//! fn describe(doc: &dyn FamilyDocument) {
//!     let manager = doc.family_manager();
//!     println!("{} types, {} parameters", manager.types().len(), manager.parameters().len());
//! }
//! ```

pub mod elements;
pub mod error;
pub mod geometry;
pub mod parameters;
pub mod traits;
pub mod types;
pub mod units;

// Re-export all public types
pub use elements::*;
pub use error::*;
pub use geometry::*;
pub use parameters::*;
pub use traits::*;
pub use types::*;
pub use units::*;
