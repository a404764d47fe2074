use serde_json::Value;
use uuid::Uuid;

use super::common::TestServer;

#[tokio::test]
async fn health_check_returns_ok() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(server.url("/echo/extra"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await;
}

#[test_log::test(tokio::test)]
async fn request_id_is_generated_and_echoed() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(server.url("/echo"))
        .send()
        .await
        .expect("Failed to send request");

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header not found in response")
        .to_str()
        .expect("Invalid x-request-id header value")
        .to_string();
    Uuid::parse_str(&request_id).expect("Generated request id is not a UUID");

    let body: Value = response.json().await.expect("Failed to parse response as JSON");
    assert_eq!(body["headers"]["x-request-id"], request_id.as_str());

    server.stop().await;
}

#[tokio::test]
async fn caller_request_id_is_propagated() {
    let server = TestServer::start().await;
    let request_id = format!("test-{}", Uuid::new_v4());

    let response = server
        .client
        .get(server.url("/echo"))
        .header("x-request-id", &request_id)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some(request_id.as_str())
    );

    server.stop().await;
}

#[tokio::test]
async fn response_is_indented_with_keys_in_order() {
    let server = TestServer::start().await;

    let text = server
        .client
        .post(server.url("/echo?x=1"))
        .body(r#"{"a": 1}"#)
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read response body");

    assert!(text.starts_with("{\n  \"method\": \"POST\",\n  \"url\": "));

    let positions: Vec<usize> = ["\"method\"", "\"url\"", "\"headers\"", "\"params\"", "\"body\""]
        .iter()
        .map(|key| text.find(&format!("\n  {}", key)).expect("Missing top-level key"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "keys out of order: {}", text);
    assert!(text.ends_with("  \"body\": {\n    \"a\": 1\n  }\n}"));

    server.stop().await;
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let server = TestServer::start().await;

    let response = server
        .client
        .get(server.url("/echo"))
        .header("origin", "https://portal.example.com")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    server.stop().await;
}
