// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # famglb Bridge
//!
//! Serves live re-exports of a family over HTTP. Network handlers run on a
//! multi-threaded runtime; every document change happens on one authority
//! thread that owns the document and drains a command queue.
//!
//! ```text
//! HTTP handler ──Command{request, reply}──► queue ──► Authority (owns document)
//!      ▲                                                     │
//!      └──────────────── oneshot reply (GLB or error) ◄──────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use famglb_bridge::{serve, spawn_authority, BridgeConfig};
//!
//! let config = BridgeConfig::default();
//! let (handle, _thread) = spawn_authority(Box::new(document), config.detail_level)?;
//! serve(&config, handle).await?;
//! ```

pub mod authority;
pub mod command;
pub mod config;
pub mod error;
pub mod server;

pub use authority::{spawn_authority, Authority};
pub use command::{BridgeHandle, BridgeRequest, Command, Reply};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use server::{router, serve, AppState, UpdateRequest, API_VERSION};
