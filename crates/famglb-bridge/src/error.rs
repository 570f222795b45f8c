// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the update bridge

use thiserror::Error;

/// Bridge result type
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// No reply within the configured wait; carries the operation name
    #[error("{0} timeout")]
    Timeout(&'static str),

    /// The authority thread is gone
    #[error("Authority stopped")]
    AuthorityStopped,

    /// The pipeline failed on the authority thread
    #[error("{0}")]
    Pipeline(String),

    /// Malformed client request
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        BridgeError::BadRequest(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        BridgeError::Config(msg.into())
    }
}
