//! Blocking HTTP transport for the model service.

use std::time::Duration;

use tracing::debug;

use crate::{ModelError, ModelTransport};

/// Default request timeout. Local multimodal models can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// [`ModelTransport`] over a `ureq` agent.
pub struct HttpModelTransport {
    agent: ureq::Agent,
}

impl HttpModelTransport {
    /// Creates a transport with the given overall request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for HttpModelTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ModelTransport for HttpModelTransport {
    fn post_json(&self, endpoint: &str, body: &str) -> Result<String, ModelError> {
        let response = self
            .agent
            .post(endpoint)
            .set("Content-Type", "application/json")
            .send_string(body);

        match response {
            Ok(response) => {
                debug!(status = response.status(), "model service responded");
                response.into_string().map_err(|error| {
                    ModelError::EmptyResponse(format!("response body unreadable: {error}"))
                })
            }
            Err(ureq::Error::Status(code, response)) => {
                let detail = response
                    .into_string()
                    .ok()
                    .and_then(|body| service_error_text(&body))
                    .unwrap_or_else(|| "no detail".to_string());
                Err(ModelError::ServiceUnavailable(format!(
                    "HTTP {code}: {detail}"
                )))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ModelError::ServiceUnavailable(transport.to_string()))
            }
        }
    }
}

fn service_error_text(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"].as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_service_error_text() {
        assert_eq!(
            service_error_text(r#"{"error":"model not found"}"#).as_deref(),
            Some("model not found")
        );
        assert_eq!(service_error_text("<html>bad gateway</html>"), None);
    }

    #[test]
    fn unreachable_service_is_classified() {
        // Port 9 (discard) on loopback is closed in test environments.
        let transport = HttpModelTransport::new(Duration::from_secs(2));
        let error = transport
            .post_json("http://127.0.0.1:9/api/chat", "{}")
            .expect_err("closed port should fail");
        assert!(matches!(error, ModelError::ServiceUnavailable(_)));
    }
}
