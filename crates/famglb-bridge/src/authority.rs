// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The mutation authority
//!
//! The host only allows document changes from one thread. The authority owns
//! the document outright and is the single consumer of the command queue;
//! network handlers only ever talk to it through [`BridgeHandle`].
//!
//! Failures and panics while handling a command become the command's error
//! reply. They never take the thread down.

use crate::command::{BridgeHandle, BridgeRequest, Command, Reply};
use famglb_export::{apply_values, export_current, ParameterSchema};
use famglb_model::{DetailLevel, FamilyDocument};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

const NOT_FAMILY_DOCUMENT: &str = "Not a family document";

/// Owner of the document and consumer of the command queue
pub struct Authority {
    document: Box<dyn FamilyDocument>,
    receiver: flume::Receiver<Command>,
    detail_level: DetailLevel,
}

impl Authority {
    /// `detail_level` applies to requests that do not name one
    pub fn new(
        document: Box<dyn FamilyDocument>,
        receiver: flume::Receiver<Command>,
        detail_level: DetailLevel,
    ) -> Self {
        Self {
            document,
            receiver,
            detail_level,
        }
    }

    pub fn document(&self) -> &dyn FamilyDocument {
        self.document.as_ref()
    }

    /// Handle every queued command without blocking
    ///
    /// Returns the number of commands handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(command) = self.receiver.try_recv() {
            self.handle(command);
            handled += 1;
        }
        handled
    }

    /// Handle commands until every [`BridgeHandle`] is dropped
    pub fn run(mut self) {
        info!("Authority thread started for {}", self.document.title());
        while let Ok(command) = self.receiver.recv() {
            self.handle(command);
        }
        info!("Authority thread stopped");
    }

    /// Move the authority onto its own thread
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("famglb-authority".to_string())
            .spawn(move || self.run())
    }

    fn handle(&mut self, command: Command) {
        let Command { request, reply } = command;
        let operation = request.operation();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&request)))
            .unwrap_or_else(|payload| Err(panic_message(payload)));

        if self.document.has_open_transaction() {
            if let Err(e) = self.document.rollback_transaction() {
                error!("Failed to roll back after {}: {}", operation, e);
            }
        }
        if let Err(message) = &result {
            warn!("{} failed: {}", operation, message);
        }

        if reply.send(result).is_err() {
            debug!("{} finished after its caller gave up", operation);
        }
    }

    /// Run one request against the document
    pub fn execute(&mut self, request: &BridgeRequest) -> Reply {
        if !self.document.is_family_document() {
            return Err(NOT_FAMILY_DOCUMENT.to_string());
        }

        let detail_level = match request {
            BridgeRequest::ApplyAndExport {
                values,
                type_name,
                detail_level,
            } => {
                self.apply(values, type_name.as_deref())?;
                detail_level.unwrap_or(self.detail_level)
            }
            BridgeRequest::ExportOnly => self.detail_level,
        };

        self.document.regenerate().map_err(|e| e.to_string())?;

        let scene =
            export_current(self.document.as_ref(), detail_level).map_err(|e| e.to_string())?;
        debug!(
            "Exported {} vertices, {} triangles ({} bytes)",
            scene.glb.vertex_count,
            scene.glb.triangle_count,
            scene.glb.bytes.len()
        );
        Ok(scene.glb.bytes)
    }

    /// Apply client values inside one committed transaction
    fn apply(
        &mut self,
        values: &BTreeMap<String, Value>,
        type_name: Option<&str>,
    ) -> Result<(), String> {
        let document = self.document.as_mut();
        document
            .start_transaction("Update Parameters")
            .map_err(|e| e.to_string())?;

        if let Some(name) = type_name {
            let known = document.family_manager().types().iter().any(|t| t == name);
            if known {
                document
                    .family_manager_mut()
                    .set_current_type(name)
                    .map_err(|e| e.to_string())?;
            } else {
                warn!("Unknown family type {}; keeping the current type", name);
            }
        }

        let schema = ParameterSchema::collect(document.family_manager());
        let (applied, rejected) = apply_values(document.family_manager_mut(), &schema, values);
        debug!("Applied {} values, {} rejected", applied, rejected.len());

        document.commit_transaction().map_err(|e| e.to_string())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Unexpected failure: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Unexpected failure: {}", message)
    } else {
        "Unexpected failure".to_string()
    }
}

/// Start the authority thread for a document
pub fn spawn_authority(
    document: Box<dyn FamilyDocument>,
    detail_level: DetailLevel,
) -> std::io::Result<(BridgeHandle, JoinHandle<()>)> {
    let (handle, receiver) = BridgeHandle::channel();
    let thread = Authority::new(document, receiver, detail_level).spawn()?;
    Ok((handle, thread))
}
