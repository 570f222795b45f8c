// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP front end of the bridge
//!
//! | Route         | Method | Reply                                  |
//! |---------------|--------|----------------------------------------|
//! | `/api/update` | POST   | GLB after applying the posted values   |
//! | `/api/export` | any    | GLB of the current state               |
//! | `/api/status` | any    | `{ running, port, version }`           |
//!
//! Errors are JSON `{ "error": message }`. `OPTIONS` always answers 200 and
//! every response carries permissive CORS headers.

use crate::command::{BridgeHandle, BridgeRequest};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::{Json, Router};
use famglb_model::DetailLevel;
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Version reported by `/api/status`
pub const API_VERSION: &str = "1.0.0";

/// State shared by the handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub handle: BridgeHandle,
    pub port: u16,
    pub timeout: Duration,
}

impl AppState {
    pub fn new(handle: BridgeHandle, config: &BridgeConfig) -> Self {
        Self {
            handle,
            port: config.port,
            timeout: config.timeout(),
        }
    }
}

/// Body of `POST /api/update`; PascalCase keys are accepted too
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default, alias = "Parameters")]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, rename = "typeName", alias = "TypeName")]
    pub type_name: Option<String>,
    #[serde(default, rename = "detailLevel", alias = "DetailLevel")]
    pub detail_level: Option<String>,
}

impl UpdateRequest {
    /// Validate and turn into a bridge request
    pub fn into_request(self) -> Result<BridgeRequest> {
        let detail_level = self
            .detail_level
            .map(|level| level.parse::<DetailLevel>())
            .transpose()
            .map_err(|e| BridgeError::bad_request(e.to_string()))?;

        Ok(BridgeRequest::ApplyAndExport {
            values: self.parameters,
            type_name: self.type_name,
            detail_level,
        })
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/update", post(update).fallback(method_not_allowed))
        .route("/api/export", any(export))
        .route("/api/status", any(status))
        .fallback(not_found)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &BridgeConfig, handle: BridgeHandle) -> Result<()> {
    let address = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on http://{}", address);

    axum::serve(listener, router(AppState::new(handle, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };
    apply_cors(response.headers_mut());
    response
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match self {
            BridgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}

fn glb_response(bytes: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response()
}

async fn run(state: &AppState, request: BridgeRequest) -> Response {
    match state.handle.request(request, state.timeout).await {
        Ok(bytes) => glb_response(bytes),
        Err(e) => e.into_response(),
    }
}

async fn update(State(state): State<AppState>, body: Bytes) -> Response {
    let request = serde_json::from_slice::<UpdateRequest>(&body)
        .map_err(|e| BridgeError::bad_request(e.to_string()))
        .and_then(UpdateRequest::into_request);

    match request {
        Ok(request) => run(&state, request).await,
        Err(e) => e.into_response(),
    }
}

async fn export(State(state): State<AppState>) -> Response {
    run(&state, BridgeRequest::ExportOnly).await
}

async fn status(State(state): State<AppState>) -> Response {
    Json(json!({
        "running": true,
        "port": state.port,
        "version": API_VERSION,
    }))
    .into_response()
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
