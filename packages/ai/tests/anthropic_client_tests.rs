// ABOUTME: HTTP-level tests for the Anthropic client against a mock Messages endpoint
// ABOUTME: Covers request shape and headers, text extraction, usage and provider error mapping

use rehearse_ai::{AIService, AIServiceError, GenerationRequest, TextGenerator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn messages_response(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "usage": { "input_tokens": 12, "output_tokens": 34 }
    })
}

fn service_for(server: &MockServer) -> AIService {
    AIService::new(Some("test-key".to_string()))
        .with_model("claude-test")
        .with_api_url(format!("{}/v1/messages", server.uri()))
}

#[tokio::test]
async fn test_generate_returns_raw_text_of_first_block() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "model": "claude-test", "system": "be brief" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_response("```json\n{}\n```")))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let text = service
        .generate(&GenerationRequest::new("hello").with_system_prompt("be brief"))
        .await
        .unwrap();

    // The capability hands back untrusted text untouched
    assert_eq!(text, "```json\n{}\n```");
}

#[tokio::test]
async fn test_prompt_is_sent_as_single_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "user", "content": "Why PostgreSQL?" }],
            "max_tokens": 4096,
            "model": "claude-test"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(messages_response("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let response = service
        .generate_text("Why PostgreSQL?", None)
        .await
        .unwrap();

    assert_eq!(response.data, "ok");
    assert_eq!(response.usage.total_tokens(), 46);
}

#[tokio::test]
async fn test_non_success_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let err = service.generate(&GenerationRequest::new("hello")).await.unwrap_err();

    match err {
        AIServiceError::Status { status, body } => {
            assert_eq!(status, 529);
            assert_eq!(body, "overloaded");
        }
        other => panic!("Expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reply_without_text_block_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_02",
            "content": [],
            "usage": { "input_tokens": 1, "output_tokens": 0 }
        })))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let err = service.generate(&GenerationRequest::new("hello")).await.unwrap_err();
    assert!(matches!(err, AIServiceError::EmptyResponse));
}
