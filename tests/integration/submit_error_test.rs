// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::test_client;
use uxprobe::client::ClientError;
use uxprobe::domain::models::job::JobRequest;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_submission_http_500_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_string("analyzer crashed"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .submit(&JobRequest::for_url("http://x/mock.html"))
        .await
        .unwrap_err();

    match err {
        ClientError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "analyzer crashed");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submission_is_never_retried() {
    let server = MockServer::start().await;
    // expect(1) 由 MockServer 在 drop 时校验：失败的提交不能被重试
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.submit(&JobRequest::for_url("http://x/mock.html")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_submission_against_dead_service_fails_fast() {
    let client = test_client("http://127.0.0.1:1");

    let err = client
        .submit(&JobRequest::for_url("http://x/mock.html"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)));
}

#[tokio::test]
async fn test_malformed_submission_response_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .submit(&JobRequest::for_url("http://x/mock.html"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}
