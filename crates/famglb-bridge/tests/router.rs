// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP routes driven through the router without a socket

use approx::assert_relative_eq;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use famglb_bridge::{router, spawn_authority, AppState, BridgeConfig, BridgeHandle};
use famglb_export::{read_asset_metadata, read_glb};
use famglb_memdoc::MemoryDocument;
use famglb_model::DetailLevel;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

fn live_state() -> AppState {
    let document = Box::new(MemoryDocument::sample().unwrap());
    let (handle, _thread) = spawn_authority(document, DetailLevel::Coarse).unwrap();
    AppState::new(handle, &BridgeConfig::default())
}

async fn send(state: AppState, method: Method, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    router(state).oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn assert_cors(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

#[tokio::test]
async fn test_status() {
    let response = send(live_state(), Method::GET, "/api/status", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let body = body_json(response).await;
    assert_eq!(body["running"], true);
    assert_eq!(body["port"], 8080);
    assert_eq!(body["version"], "1.0.0");
}

#[tokio::test]
async fn test_update_returns_glb() {
    let response = send(
        live_state(),
        Method::POST,
        "/api/update",
        r#"{ "parameters": { "Width": 1.2192 }, "typeName": "915 x 2134" }"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );

    let bytes = body_bytes(response).await;
    let metadata = read_asset_metadata(&read_glb(&bytes).unwrap()).unwrap();
    let width = metadata.types[0].values["Width"].as_f64().unwrap();
    assert_relative_eq!(width, 1.2192, epsilon = 1e-9);
}

#[tokio::test]
async fn test_pascal_case_update() {
    let response = send(
        live_state(),
        Method::POST,
        "/api/update",
        r#"{ "Parameters": { "Mark": "D4" }, "TypeName": "813 x 2032" }"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = body_bytes(response).await;
    let metadata = read_asset_metadata(&read_glb(&bytes).unwrap()).unwrap();
    assert_eq!(metadata.types[0].name, "813 x 2032");
}

#[tokio::test]
async fn test_export() {
    let response = send(live_state(), Method::GET, "/api/export", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[0..4], b"glTF");
}

#[tokio::test]
async fn test_malformed_body() {
    let response = send(live_state(), Method::POST, "/api/update", "{ not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_update_requires_post() {
    let response = send(live_state(), Method::GET, "/api/update", "").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await["error"], "Method not allowed");
}

#[tokio::test]
async fn test_unknown_path() {
    let response = send(live_state(), Method::GET, "/api/nothing", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    assert_eq!(body_json(response).await["error"], "Not found");
}

#[tokio::test]
async fn test_options_preflight() {
    for uri in ["/api/update", "/api/nothing"] {
        let response = send(live_state(), Method::OPTIONS, uri, "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
    }
}

#[tokio::test]
async fn test_update_timeout() {
    // Nobody drains the queue
    let (handle, _receiver) = BridgeHandle::channel();
    let state = AppState {
        handle,
        port: 8080,
        timeout: Duration::from_millis(50),
    };

    let response = send(state, Method::POST, "/api/update", r#"{ "parameters": {} }"#).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Update timeout");
}

#[tokio::test]
async fn test_concurrent_requests_are_matched() {
    let state = live_state();
    let narrow = send(
        state.clone(),
        Method::POST,
        "/api/update",
        r#"{ "parameters": { "Width": 0.6096 } }"#,
    );
    let wide = send(
        state,
        Method::POST,
        "/api/update",
        r#"{ "parameters": { "Width": 1.524 } }"#,
    );
    let (narrow, wide) = tokio::join!(narrow, wide);

    for (response, expected) in [(narrow, 0.6096), (wide, 1.524)] {
        let bytes = body_bytes(response).await;
        let metadata = read_asset_metadata(&read_glb(&bytes).unwrap()).unwrap();
        let width = metadata.types[0].values["Width"].as_f64().unwrap();
        assert_relative_eq!(width, expected, epsilon = 1e-9);
    }
}
