// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands sent to the authority thread
//!
//! Every command carries its own reply channel, so concurrent callers never
//! see each other's results. The queue has a single consumer and commands
//! run in arrival order.

use crate::error::{BridgeError, Result};
use famglb_model::DetailLevel;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::oneshot;

/// Scene bytes, or the error message produced on the authority thread
pub type Reply = std::result::Result<Vec<u8>, String>;

/// Work for the authority thread
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeRequest {
    /// Apply client values, optionally switch configuration, then export
    ApplyAndExport {
        values: BTreeMap<String, Value>,
        type_name: Option<String>,
        detail_level: Option<DetailLevel>,
    },
    /// Export the current state unchanged
    ExportOnly,
}

impl BridgeRequest {
    /// Operation name used in timeout messages
    pub fn operation(&self) -> &'static str {
        match self {
            BridgeRequest::ApplyAndExport { .. } => "Update",
            BridgeRequest::ExportOnly => "Export",
        }
    }
}

/// A request and the channel its reply goes to
#[derive(Debug)]
pub struct Command {
    pub request: BridgeRequest,
    pub reply: oneshot::Sender<Reply>,
}

impl Command {
    /// Create a command and the receiver for its reply
    pub fn new(request: BridgeRequest) -> (Self, oneshot::Receiver<Reply>) {
        let (reply, receiver) = oneshot::channel();
        (Self { request, reply }, receiver)
    }
}

/// Sending side of the command queue
#[derive(Clone, Debug)]
pub struct BridgeHandle {
    sender: flume::Sender<Command>,
}

impl BridgeHandle {
    /// Create a handle and the queue's receiving end
    pub fn channel() -> (Self, flume::Receiver<Command>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }

    /// Queue a request without waiting for it
    pub fn submit(&self, request: BridgeRequest) -> Result<oneshot::Receiver<Reply>> {
        let (command, receiver) = Command::new(request);
        self.sender
            .send(command)
            .map_err(|_| BridgeError::AuthorityStopped)?;
        Ok(receiver)
    }

    /// Queue a request and wait for its reply
    ///
    /// A request still queued or running when `timeout` elapses keeps its
    /// place; its reply is dropped.
    pub async fn request(&self, request: BridgeRequest, timeout: Duration) -> Result<Vec<u8>> {
        let operation = request.operation();
        let receiver = self.submit(request)?;

        match tokio::time::timeout(timeout, receiver).await {
            Err(_) => Err(BridgeError::Timeout(operation)),
            Ok(Err(_)) => Err(BridgeError::AuthorityStopped),
            Ok(Ok(reply)) => reply.map_err(BridgeError::Pipeline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_names_operation() {
        let (handle, _receiver) = BridgeHandle::channel();
        let err = handle
            .request(BridgeRequest::ExportOnly, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Export timeout");
    }

    #[tokio::test]
    async fn test_stopped_authority() {
        let (handle, receiver) = BridgeHandle::channel();
        drop(receiver);
        let err = handle
            .request(BridgeRequest::ExportOnly, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::AuthorityStopped));
    }

    #[tokio::test]
    async fn test_reply_is_delivered() {
        let (handle, receiver) = BridgeHandle::channel();
        let worker = std::thread::spawn(move || {
            let command = receiver.recv().unwrap();
            let _ = command.reply.send(Ok(vec![1, 2, 3]));
        });

        let bytes = handle
            .request(BridgeRequest::ExportOnly, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        worker.join().unwrap();
    }
}
