//! Integration tests for request assembly and dispatch.

use std::sync::{Arc, Mutex};

use balatro_advisor_core::{
    AnalysisKind, AnalysisRequest, CapturedFrame, EncodedAnalysisRequest, SHOP_PROMPT,
    SYSTEM_PROMPT,
};
use balatro_advisor_model::{
    ChatRole, DEFAULT_ENDPOINT, ModelClient, ModelError, ModelTransport, SamplingOptions,
};

#[derive(Default)]
struct RecordingTransport {
    bodies: Mutex<Vec<String>>,
    reply: String,
}

impl ModelTransport for RecordingTransport {
    fn post_json(&self, _endpoint: &str, body: &str) -> Result<String, ModelError> {
        self.bodies
            .lock()
            .expect("body lock should work")
            .push(body.to_string());
        Ok(self.reply.clone())
    }
}

struct DownTransport;

impl ModelTransport for DownTransport {
    fn post_json(&self, _endpoint: &str, _body: &str) -> Result<String, ModelError> {
        Err(ModelError::ServiceUnavailable("connection refused".to_string()))
    }
}

fn encoded_shop_request() -> EncodedAnalysisRequest {
    let frame = CapturedFrame::new(2, 2, vec![200; 12]).expect("frame should be valid");
    AnalysisRequest::for_kind(frame, AnalysisKind::Shop)
        .encode()
        .expect("request should encode")
}

#[test]
fn model_client_tests_request_carries_prompts_image_and_options() {
    let transport = Arc::new(RecordingTransport {
        reply: r#"{"message":{"role":"assistant","content":"Buy the Blueprint."}}"#.to_string(),
        ..RecordingTransport::default()
    });
    let client = ModelClient::new(DEFAULT_ENDPOINT, "llava", transport.clone())
        .expect("client should build");
    let encoded = encoded_shop_request();

    let reply = client.analyze(&encoded).expect("analysis should succeed");
    assert_eq!(reply, "Buy the Blueprint.");

    let bodies = transport.bodies.lock().expect("body lock should work");
    assert_eq!(bodies.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&bodies[0]).expect("body should be json");

    assert_eq!(body["model"], "llava");
    assert_eq!(body["stream"], false);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
    assert!(body["messages"][0].get("images").is_none());
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], SHOP_PROMPT);
    assert_eq!(body["messages"][1]["images"][0], encoded.image_base64.as_str());
    assert_eq!(body["options"]["top_k"], 40);
    assert_eq!(body["options"]["num_ctx"], 4096);
}

#[test]
fn model_client_tests_build_request_uses_fixed_sampling() {
    let client = ModelClient::new(DEFAULT_ENDPOINT, "mixtral", Arc::new(DownTransport))
        .expect("client should build");
    let request = client.build_request(&encoded_shop_request());

    assert_eq!(request.options, SamplingOptions::FIXED);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, ChatRole::System);
    assert_eq!(request.messages[1].images.len(), 1);
}

#[test]
fn model_client_tests_propagates_unavailable_service() {
    let client = ModelClient::new(DEFAULT_ENDPOINT, "mixtral", Arc::new(DownTransport))
        .expect("client should build");
    assert!(matches!(
        client.analyze(&encoded_shop_request()),
        Err(ModelError::ServiceUnavailable(_))
    ));
}

#[test]
fn model_client_tests_rejects_bad_configuration() {
    assert!(matches!(
        ModelClient::new("localhost:11434", "mixtral", Arc::new(DownTransport)),
        Err(ModelError::InvalidEndpoint(_))
    ));
    assert!(matches!(
        ModelClient::new(DEFAULT_ENDPOINT, "  ", Arc::new(DownTransport)),
        Err(ModelError::InvalidModel(_))
    ));
}
