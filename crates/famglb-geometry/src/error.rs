// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry processing

use thiserror::Error;

/// Geometry processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry processing errors
#[derive(Error, Debug)]
pub enum Error {
    /// Triangulation error
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// Face has no usable area or parameterization
    #[error("Degenerate face: {0}")]
    DegenerateFace(String),
}

impl Error {
    /// Create a triangulation error
    pub fn triangulation(msg: impl Into<String>) -> Self {
        Error::Triangulation(msg.into())
    }

    /// Create a degenerate face error
    pub fn degenerate_face(msg: impl Into<String>) -> Self {
        Error::DegenerateFace(msg.into())
    }
}
