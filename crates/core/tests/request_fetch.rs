//! `request.fetchAsync` against a local HTTP server.

use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use botshim_core::request::{FetchOptions, HttpError, Request};
use botshim_core::scripting::{HostObjects, SandboxConfig, ScriptEngine, ScriptOutcome};
use serde_json::{Value, json};
use std::collections::BTreeMap;

async fn spawn_server() -> String {
    let app = Router::new()
        .route(
            "/items",
            get(|| async {
                ([(header::CONTENT_TYPE, "application/json")], r#"{"ok":true,"items":[1,2]}"#)
            }),
        )
        .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "{not json") }))
        .route(
            "/echo",
            post(|headers: HeaderMap, body: String| async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let token = headers
                    .get("x-token")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "contentType": content_type, "token": token, "body": body }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

#[tokio::test]
async fn test_get_parses_json() {
    let base = spawn_server().await;
    let resp = Request::default()
        .fetch_async(&format!("{base}/items"), FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    assert!(resp.success);
    assert_eq!(resp.headers.get("content-type").map(String::as_str), Some("application/json"));
    assert_eq!(resp.json_async().await, Some(json!({"ok": true, "items": [1, 2]})));
}

#[tokio::test]
async fn test_malformed_json_is_absent_not_error() {
    let base = spawn_server().await;
    let resp = Request::default()
        .fetch_async(&format!("{base}/broken"), FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(resp.status, 500);
    assert!(!resp.success);
    assert_eq!(resp.body, "{not json");
    assert!(resp.json.is_none());
    assert!(resp.error.is_none());
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let base = spawn_server().await;
    let options = FetchOptions {
        method: Some("post".into()),
        headers: BTreeMap::from([("X-Token".to_string(), "abc".to_string())]),
        body: Some(json!({"name": "item"})),
    };
    let resp = Request::default().fetch_async(&format!("{base}/echo"), options).await.unwrap();

    let echoed = resp.json.expect("echo returns json");
    assert_eq!(echoed["contentType"], "application/json");
    assert_eq!(echoed["token"], "abc");
    let sent: Value = serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
    assert_eq!(sent, json!({"name": "item"}));
}

#[tokio::test]
async fn test_string_body_is_serialized_as_json() {
    let base = spawn_server().await;
    let options = FetchOptions {
        method: Some("POST".into()),
        headers: BTreeMap::from([("Content-Type".to_string(), "text/plain".to_string())]),
        body: Some(json!("hello there")),
    };
    let resp = Request::default().fetch_async(&format!("{base}/echo"), options).await.unwrap();

    let echoed = resp.json.expect("echo returns json");
    assert_eq!(echoed["contentType"], "text/plain");
    assert_eq!(echoed["body"], r#""hello there""#);
}

#[tokio::test]
async fn test_invalid_method_is_error() {
    let base = spawn_server().await;
    let options = FetchOptions { method: Some("TELEPORT".into()), ..Default::default() };
    let err = Request::default().fetch_async(&base, options).await.unwrap_err();
    assert_eq!(err, HttpError::InvalidMethod("TELEPORT".into()));
}

#[tokio::test]
async fn test_connection_refused_is_degraded() {
    let url = closed_port_url().await;
    let resp = Request::default().fetch_async(&url, FetchOptions::default()).await.unwrap();

    assert_eq!(resp.status, 0);
    assert!(!resp.success);
    assert!(resp.error.is_some());
    assert!(resp.json_async().await.is_none());
}

#[tokio::test]
async fn test_script_fetch_and_store() {
    let base = spawn_server().await;
    let engine = ScriptEngine::new(SandboxConfig::restricted(), HostObjects::default()).unwrap();

    let script = r#"
        function run(base)
            local resp = request.fetchAsync(base .. "/items")
            local data = resp:jsonAsync()
            context.setVariableAsync("itemCount", #data.items)
            return { status = resp.status, ok = data.ok }
        end
    "#;
    let outcome = engine.run("fetch.lua", script, vec![json!(base)]).await.unwrap();

    assert_eq!(outcome, ScriptOutcome::Completed(json!({"status": 200, "ok": true})));
    let stored = engine.with_context(|ctx| ctx.get_variable("itemCount")).unwrap().unwrap();
    assert_eq!(stored, json!(2));
}

#[tokio::test]
async fn test_script_invalid_method_raises_kind() {
    let engine = ScriptEngine::new(SandboxConfig::restricted(), HostObjects::default()).unwrap();
    let script = r#"
        function run()
            local ok, err = pcall(request.fetchAsync, "http://127.0.0.1:1", { method = "BREW" })
            return string.find(tostring(err), "InvalidMethodError") ~= nil
        end
    "#;
    let outcome = engine.run("method.lua", script, vec![]).await.unwrap();
    assert_eq!(outcome, ScriptOutcome::Completed(json!(true)));
}

#[tokio::test]
async fn test_script_degraded_response() {
    let url = closed_port_url().await;
    let engine = ScriptEngine::new(SandboxConfig::restricted(), HostObjects::default()).unwrap();
    let script = r#"
        function run(url)
            local resp = request.fetchAsync(url)
            return { status = resp.status, success = resp.success, hasError = resp.error ~= nil, json = resp:jsonAsync() }
        end
    "#;
    let outcome = engine.run("down.lua", script, vec![json!(url)]).await.unwrap();
    assert_eq!(
        outcome,
        ScriptOutcome::Completed(json!({"status": 0, "success": false, "hasError": true}))
    );
}
