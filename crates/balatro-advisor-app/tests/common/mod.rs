//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use balatro_advisor_capture::{MockGdi, WindowCapture, WindowRect};
use balatro_advisor_model::{DEFAULT_ENDPOINT, ModelClient, ModelError, ModelTransport};

/// Scripted model service that records every request body.
#[allow(dead_code)]
pub struct ScriptedService {
    pub reply: Result<String, String>,
    pub bodies: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedService {
    pub fn replying(content: &str) -> Arc<Self> {
        let body = serde_json::json!({
            "model": "mixtral",
            "message": { "role": "assistant", "content": content },
            "done": true,
        });
        Arc::new(Self {
            reply: Ok(body.to_string()),
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn raw(body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body.to_string()),
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("connection refused".to_string()),
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.bodies.lock().expect("body lock should work").len()
    }

    pub fn last_body(&self) -> serde_json::Value {
        let bodies = self.bodies.lock().expect("body lock should work");
        let raw = bodies.last().expect("at least one request should be recorded");
        serde_json::from_str(raw).expect("request body should be json")
    }
}

impl ModelTransport for ScriptedService {
    fn post_json(&self, _endpoint: &str, body: &str) -> Result<String, ModelError> {
        self.bodies
            .lock()
            .expect("body lock should work")
            .push(body.to_string());
        self.reply
            .clone()
            .map_err(ModelError::ServiceUnavailable)
    }
}

/// Client bound to a scripted service.
#[allow(dead_code)]
pub fn client_for(service: &Arc<ScriptedService>) -> ModelClient {
    ModelClient::new(DEFAULT_ENDPOINT, "mixtral", service.clone())
        .expect("model client should build")
}

/// Mock desktop with one 800x600 window titled `TestApp`.
#[allow(dead_code)]
pub fn test_app_grabber() -> WindowCapture<MockGdi> {
    WindowCapture::new(MockGdi::new().with_window("TestApp", WindowRect::new(0, 0, 800, 600)))
}
