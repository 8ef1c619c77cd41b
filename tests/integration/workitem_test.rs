// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use uxprobe::client::ClientError;
use uxprobe::config::settings::WorkItemSettings;
use uxprobe::infrastructure::workitem::WorkItemClient;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(base_url: String) -> WorkItemSettings {
    WorkItemSettings {
        base_url,
        pat: "secret-pat".to_string(),
        api_version: "7.1".to_string(),
        request_timeout: 5,
    }
}

#[tokio::test]
async fn test_get_work_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_apis/wit/workitems/1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1234,
            "fields": {
                "System.Title": "Craft bug: clipped label",
                "System.State": "New"
            }
        })))
        .mount(&server)
        .await;

    let client = WorkItemClient::new(&settings_for(server.uri())).unwrap();
    let item = client.get_work_item(1234).await.unwrap();

    assert_eq!(item.id, 1234);
    assert_eq!(
        item.fields["System.Title"].as_str(),
        Some("Craft bug: clipped label")
    );
}

#[tokio::test]
async fn test_create_sends_json_patch_with_pat_auth() {
    let server = MockServer::start().await;
    // PAT以空用户名的Basic方式携带：base64(":secret-pat")
    Mock::given(method("POST"))
        .and(path("/_apis/wit/workitems/$Bug"))
        .and(header("Content-Type", "application/json-patch+json"))
        .and(header("Authorization", "Basic OnNlY3JldC1wYXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5678,
            "fields": {"System.Title": "Craft bug: misaligned icon"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WorkItemClient::new(&settings_for(server.uri())).unwrap();
    let item = client
        .create_work_item(
            "Bug",
            "Craft bug: misaligned icon",
            Some("Icon drifts 3px on hover"),
            &["craft-bug".to_string(), "ux".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(item.id, 5678);

    // 请求体是 op:add 的字段操作列表
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let ops = body.as_array().unwrap();
    assert_eq!(ops[0]["op"], "add");
    assert_eq!(ops[0]["path"], "/fields/System.Title");
    assert_eq!(ops[1]["path"], "/fields/System.Description");
    assert_eq!(ops[2]["path"], "/fields/System.Tags");
    assert_eq!(ops[2]["value"], "craft-bug; ux");
}

#[tokio::test]
async fn test_create_surfaces_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("PAT expired"))
        .mount(&server)
        .await;

    let client = WorkItemClient::new(&settings_for(server.uri())).unwrap();
    let err = client
        .create_work_item("Bug", "title", None, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http { status: 401, .. }));
}

#[tokio::test]
async fn test_empty_title_is_rejected_locally() {
    let client = WorkItemClient::new(&settings_for("http://127.0.0.1:1".to_string())).unwrap();
    let err = client.create_work_item("Bug", "", None, &[]).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidRequest(_)));
}
