// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for host document access

use crate::StorageKind;
use thiserror::Error;

/// Result type alias for host document operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by a host document or while converting values for it
#[derive(Error, Debug)]
pub enum ModelError {
    /// Parameter name not defined on the family
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Configuration (family type) name not defined
    #[error("Family type not found: {0}")]
    TypeNotFound(String),

    /// Value does not fit the parameter's storage kind
    #[error("Type mismatch for parameter {parameter}: expected {expected}, got {actual}")]
    TypeMismatch {
        parameter: String,
        expected: StorageKind,
        actual: String,
    },

    /// Reporting parameters are computed and cannot be set
    #[error("Parameter {0} is a reporting parameter and cannot be set")]
    ReportingParameter(String),

    /// Mutation attempted without an open transaction, or transaction misuse
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Typed-identifier (data type) lookup failed for a definition
    #[error("Data type lookup failed for {parameter}: {message}")]
    DataTypeLookup { parameter: String, message: String },

    /// A geometric reference could not be converted to a stable token
    #[error("Reference conversion failed: {0}")]
    Reference(String),

    /// Geometry buffer violates its layout invariants
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Invalid host document description
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Create a type mismatch error
    pub fn type_mismatch(
        parameter: impl Into<String>,
        expected: StorageKind,
        actual: impl Into<String>,
    ) -> Self {
        ModelError::TypeMismatch {
            parameter: parameter.into(),
            expected,
            actual: actual.into(),
        }
    }

    /// Create a transaction error
    pub fn transaction(msg: impl Into<String>) -> Self {
        ModelError::Transaction(msg.into())
    }

    /// Create a reference conversion error
    pub fn reference(msg: impl Into<String>) -> Self {
        ModelError::Reference(msg.into())
    }

    /// Create an invalid geometry error
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        ModelError::InvalidGeometry(msg.into())
    }

    /// Create an invalid document error
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        ModelError::InvalidDocument(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ModelError::Other(msg.into())
    }
}
