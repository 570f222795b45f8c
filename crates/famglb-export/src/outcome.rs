// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Summary of an export pass, as reported to callers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one export pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub success: bool,
    /// Requested configurations, including ones skipped for empty geometry
    pub type_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub byte_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExportOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(
                f,
                "{} types, {} vertices, {} triangles, {} bytes",
                self.type_count, self.vertex_count, self.triangle_count, self.byte_size
            )
        } else {
            write!(
                f,
                "export failed: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
