//! Router tests for the run API.
//!
//! Each test builds the router over a store in a temp directory and drives it
//! with `oneshot` requests, checking status codes and the `{ error }` body
//! contract as well as the persisted effect of every call.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use passprep_core::{build_course_state, Settings};
use passprep_run::RunStore;
use passprep_server::{build_router, AppState};
use passprep_test_utils::{demo_project, fixed_clock};
use serde_json::{json, Value};
use tower::util::ServiceExt;

fn setup() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let store = RunStore::open(dir.path().join("runs.json"));
    (dir, build_router(AppState::new(store)))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let resp = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(router: &Router) -> String {
    let (status, run) = send(router, Method::POST, "/runs", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    run["id"].as_str().unwrap().to_string()
}

/// POST creates a pending run and GET returns the same record.
#[tokio::test]
async fn create_then_fetch() {
    let (_dir, router) = setup();
    let (status, run) = send(
        &router,
        Method::POST,
        "/runs",
        Some(json!({ "settings": { "moduleCount": "3", "workbookDepth": "Light" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["currentStage"], Value::Null);
    assert_eq!(run["settings"]["moduleCount"], 3);
    assert_eq!(run["stageStatus"].as_object().unwrap().len(), 7);

    let id = run["id"].as_str().unwrap();
    let (status, fetched) = send(&router, Method::GET, &format!("/runs/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, run);
}

/// POST without a body still creates a run with null settings.
#[tokio::test]
async fn create_without_body() {
    let (_dir, router) = setup();
    let (status, run) = send(&router, Method::POST, "/runs", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["settings"], Value::Null);
}

#[tokio::test]
async fn unknown_run_is_404_with_error_body() {
    let (_dir, router) = setup();
    let (status, body) = send(&router, Method::GET, "/runs/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Run not found" }));
}

/// PATCH advances, merges artifacts, and records errors as failed stages.
#[tokio::test]
async fn patch_advances_stage() {
    let (_dir, router) = setup();
    let id = create(&router).await;
    let uri = format!("/runs/{id}/stages");

    let (status, run) = send(
        &router,
        Method::PATCH,
        &uri,
        Some(json!({
            "stage": "upload-received",
            "message": "Upload parse failed",
            "error": { "message": "bad json", "details": "Could not parse JSON upload", "retriable": true },
            "audit": { "durationMs": 0, "tokenInput": 0, "tokenOutput": 0, "estimatedCostUsd": 0 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["stageStatus"]["upload-received"], "failed");
    assert_eq!(run["lastError"]["message"], "bad json");
    assert_eq!(run["events"][0]["audit"]["durationMs"], 0);

    let (status, run) = send(
        &router,
        Method::PATCH,
        &uri,
        Some(json!({ "stage": "upload-received", "artifacts": { "sourceUpload": { "videos": [] } } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["stageStatus"]["upload-received"], "completed");
    assert!(run.get("lastError").is_none());
    assert_eq!(run["artifacts"]["sourceUpload"], json!({ "videos": [] }));
    assert_eq!(run["events"].as_array().unwrap().len(), 2);
}

/// Audit figures are echoed back exactly, whatever their shape.
#[tokio::test]
async fn patch_keeps_audit_payload_verbatim() {
    let (_dir, router) = setup();
    let id = create(&router).await;
    let audit = json!({ "durationMs": 12.5, "tokenInput": 3, "model": "x" });

    let (status, run) = send(
        &router,
        Method::PATCH,
        &format!("/runs/{id}/stages"),
        Some(json!({ "stage": "upload-received", "audit": audit })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["events"][0]["audit"], audit);

    let (_, fetched) = send(&router, Method::GET, &format!("/runs/{id}"), None).await;
    assert_eq!(fetched["events"][0]["audit"], audit);
}

/// A course state posted through PATCH is stored verbatim.
#[tokio::test]
async fn patch_stores_course_state() {
    let (_dir, router) = setup();
    let id = create(&router).await;
    let uri = format!("/runs/{id}/stages");
    let state = build_course_state(&demo_project(), &Settings::new(), &fixed_clock());

    send(&router, Method::PATCH, &uri, Some(json!({ "stage": "upload-received" }))).await;
    let (status, run) = send(
        &router,
        Method::PATCH,
        &uri,
        Some(json!({ "stage": "normalized", "courseState": state })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["courseState"], serde_json::to_value(&state).unwrap());
}

#[tokio::test]
async fn patch_requires_stage() {
    let (_dir, router) = setup();
    let id = create(&router).await;
    let (status, body) = send(
        &router,
        Method::PATCH,
        &format!("/runs/{id}/stages"),
        Some(json!({ "message": "no stage" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "stage is required" }));
}

#[tokio::test]
async fn patch_rejects_unknown_stage_and_skips() {
    let (_dir, router) = setup();
    let id = create(&router).await;
    let uri = format!("/runs/{id}/stages");

    let (status, body) = send(&router, Method::PATCH, &uri, Some(json!({ "stage": "done" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unknown stage: done");

    let (status, body) =
        send(&router, Method::PATCH, &uri, Some(json!({ "stage": "validated" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid stage transition none -> validated");

    let (_, run) = send(&router, Method::GET, &format!("/runs/{id}"), None).await;
    assert_eq!(run["events"], json!([]));
}

#[tokio::test]
async fn patch_unknown_run_is_400() {
    let (_dir, router) = setup();
    let (status, body) = send(
        &router,
        Method::PATCH,
        "/runs/missing/stages",
        Some(json!({ "stage": "upload-received" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("run not found"));
}

#[tokio::test]
async fn patch_with_invalid_json_is_400() {
    let (_dir, router) = setup();
    let id = create(&router).await;
    let req = Request::builder()
        .method(Method::PATCH)
        .uri(format!("/runs/{id}/stages"))
        .body(Body::from("{ nope"))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn healthz() {
    let (_dir, router) = setup();
    let (status, body) = send(&router, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}
