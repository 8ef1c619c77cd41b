// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use uxprobe::client::ClientError;
use uxprobe::config::settings::GenAiSettings;
use uxprobe::infrastructure::genai::GenAiClient;

/// 假完成服务：只接受 `good-key`，其余密钥一律429
async fn start_quota_server(calls: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route(
            "/chat/completions",
            post(
                |State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap, Json(_): Json<Value>| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("");
                    if auth == "Bearer good-key" {
                        Json(json!({
                            "choices": [{"message": {"content": "Contrast ratio is 2.1:1."}}],
                            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
                        }))
                        .into_response()
                    } else {
                        (axum::http::StatusCode::TOO_MANY_REQUESTS, "quota exceeded").into_response()
                    }
                },
            ),
        )
        .with_state(calls);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn settings_for(base_url: String, keys: Vec<&str>) -> GenAiSettings {
    GenAiSettings {
        base_url,
        model: "gpt-4o-mini".to_string(),
        api_keys: keys.into_iter().map(String::from).collect(),
        request_timeout: 5,
    }
}

#[tokio::test]
async fn test_complete_rotates_past_exhausted_keys() {
    let calls = Arc::new(AtomicUsize::new(0));
    let base_url = start_quota_server(calls.clone()).await;

    let client = GenAiClient::new(&settings_for(
        base_url,
        vec!["dead-key-1", "dead-key-2", "good-key"],
    ))
    .unwrap();

    let completion = client.complete("Describe the contrast issue.").await.unwrap();

    assert_eq!(completion.content, "Contrast ratio is 2.1:1.");
    assert_eq!(completion.usage.total_tokens, 20);
    // 两个坏密钥各试一次，第三个成功
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_complete_is_bounded_by_key_count() {
    let calls = Arc::new(AtomicUsize::new(0));
    let base_url = start_quota_server(calls.clone()).await;

    let client = GenAiClient::new(&settings_for(base_url, vec!["dead-key-1", "dead-key-2"])).unwrap();

    let err = client.complete("prompt").await.unwrap_err();

    // 所有密钥轮换一遍后上报最后一次拒绝，总请求数有界
    assert!(matches!(err, ClientError::Http { status: 429, .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_complete_without_keys_is_invalid_request() {
    let client = GenAiClient::new(&settings_for("http://127.0.0.1:1".to_string(), vec![])).unwrap();
    let err = client.complete("prompt").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
}
