// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the export pipeline

use famglb_model::ModelError;
use thiserror::Error;

/// Export result type
pub type Result<T> = std::result::Result<T, ExportError>;

/// Export pipeline errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// The open document is not a family document
    #[error("This export must be run on a family document")]
    NotFamilyDocument,

    /// The family defines no configurations
    #[error("No family types found. Create at least one family type before exporting")]
    NoFamilyTypes,

    /// Host document error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// GLB container error
    #[error("GLB error: {0}")]
    Glb(String),

    /// Metadata payload error
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Create a GLB error
    pub fn glb(msg: impl Into<String>) -> Self {
        ExportError::Glb(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        ExportError::Metadata(msg.into())
    }

    /// Whether the export was refused before any work started
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ExportError::NotFamilyDocument | ExportError::NoFamilyTypes
        )
    }
}
