#![warn(missing_docs)]
//! # balatro-advisor-model
//!
//! ## Purpose
//! Sends one screenshot plus fixed instructions to a locally hosted
//! multimodal model and returns its text reply.
//!
//! ## Responsibilities
//! - Define the chat request/response wire schema (Ollama `/api/chat`).
//! - Pin the sampling parameters used for every request.
//! - Execute the request through an injectable [`ModelTransport`].
//! - Classify failures as unreachable service or empty reply.
//!
//! ## Data flow
//! [`EncodedAnalysisRequest`] -> [`ModelClient::build_request`] ->
//! JSON body -> [`ModelTransport::post_json`] -> [`parse_chat_response`] ->
//! reply text.
//!
//! ## Error model
//! Transport and HTTP status failures are [`ModelError::ServiceUnavailable`];
//! unparsable or blank replies are [`ModelError::EmptyResponse`]. There are
//! no retries at this layer.
//!
//! ## Security and privacy notes
//! Logs record sizes and endpoints only, never image data or prompt text.

pub mod http;

use std::sync::Arc;

use balatro_advisor_core::{EncodedAnalysisRequest, SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub use http::HttpModelTransport;

/// Default local Ollama chat endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/api/chat";

/// Default model name.
pub const DEFAULT_MODEL: &str = "mixtral";

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instructions.
    System,
    /// End-user turn.
    User,
    /// Model reply.
    Assistant,
}

/// One message in a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Base64-encoded images attached to the message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    /// Softmax temperature.
    pub temperature: f32,
    /// Nucleus sampling threshold.
    pub top_p: f32,
    /// Top-k cutoff.
    pub top_k: u32,
    /// Context window size in tokens.
    pub num_ctx: u32,
}

impl SamplingOptions {
    /// The fixed parameters used for all analyses.
    pub const FIXED: SamplingOptions = SamplingOptions {
        temperature: 0.7,
        top_p: 0.9,
        top_k: 40,
        num_ctx: 4096,
    };
}

/// Chat request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model name.
    pub model: String,
    /// System message followed by one user message.
    pub messages: Vec<ChatMessage>,
    /// Always `false`; replies arrive as one body.
    pub stream: bool,
    /// Sampling parameters.
    pub options: SamplingOptions,
}

/// Chat response body. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Model that produced the reply.
    #[serde(default)]
    pub model: Option<String>,
    /// Reply message.
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    /// Service-side error text.
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply message inside a [`ChatResponse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseMessage {
    /// Author role, normally `assistant`.
    #[serde(default)]
    pub role: Option<ChatRole>,
    /// Reply text.
    #[serde(default)]
    pub content: String,
}

/// Parses a raw response body into reply text.
///
/// Non-blank content is returned unchanged.
///
/// # Errors
/// Returns [`ModelError::ServiceUnavailable`] when the body carries a service
/// error, and [`ModelError::EmptyResponse`] when it is not JSON, has no
/// message, or the content is blank.
pub fn parse_chat_response(raw: &str) -> Result<String, ModelError> {
    let parsed: ChatResponse = serde_json::from_str(raw)
        .map_err(|error| ModelError::EmptyResponse(format!("malformed response body: {error}")))?;

    if let Some(error) = parsed.error.filter(|error| !error.trim().is_empty()) {
        return Err(ModelError::ServiceUnavailable(error));
    }

    let content = parsed
        .message
        .map(|message| message.content)
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ModelError::EmptyResponse(
            "response contained no message content".to_string(),
        ));
    }

    Ok(content)
}

/// Abstract transport used by [`ModelClient`].
pub trait ModelTransport: Send + Sync {
    /// Posts a JSON body and returns the raw response body.
    ///
    /// # Errors
    /// Returns [`ModelError::ServiceUnavailable`] when the service cannot be
    /// reached or answers with an error status.
    fn post_json(&self, endpoint: &str, body: &str) -> Result<String, ModelError>;
}

/// Client that validates the endpoint and runs one analysis per call.
#[derive(Clone)]
pub struct ModelClient {
    endpoint: String,
    model: String,
    transport: Arc<dyn ModelTransport>,
}

impl ModelClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidEndpoint`] when the endpoint is not an
    /// `http` or `https` URL, and [`ModelError::InvalidModel`] when the model
    /// name is blank.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        transport: Arc<dyn ModelTransport>,
    ) -> Result<Self, ModelError> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;

        let model = model.into();
        if model.trim().is_empty() {
            return Err(ModelError::InvalidModel("model name is empty".to_string()));
        }

        Ok(Self {
            endpoint,
            model,
            transport,
        })
    }

    /// Builds the request body for one analysis.
    pub fn build_request(&self, request: &EncodedAnalysisRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: ChatRole::System,
                    content: SYSTEM_PROMPT.to_string(),
                    images: Vec::new(),
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: request.instructions.clone(),
                    images: vec![request.image_base64.clone()],
                },
            ],
            stream: false,
            options: SamplingOptions::FIXED,
        }
    }

    /// Sends one analysis request and returns the reply text.
    ///
    /// # Errors
    /// Propagates transport failures and response classification from
    /// [`parse_chat_response`].
    pub fn analyze(&self, request: &EncodedAnalysisRequest) -> Result<String, ModelError> {
        let body = serde_json::to_string(&self.build_request(request)).map_err(ModelError::Encode)?;

        info!(
            endpoint = %self.endpoint,
            model = %self.model,
            width = request.width,
            height = request.height,
            png_bytes = request.png_len,
            body_bytes = body.len(),
            "dispatching analysis request"
        );

        let raw = self.transport.post_json(&self.endpoint, &body)?;
        let result = parse_chat_response(&raw);
        match &result {
            Ok(text) => info!(reply_chars = text.chars().count(), "analysis reply received"),
            Err(error) => warn!(error = %error, "analysis reply rejected"),
        }
        result
    }

    /// Configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Validates that the endpoint is an absolute `http`/`https` URL.
///
/// # Errors
/// Returns [`ModelError::InvalidEndpoint`] otherwise.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ModelError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| ModelError::InvalidEndpoint(format!("invalid model url: {error}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ModelError::InvalidEndpoint(format!(
            "model endpoint must use http or https, got {other}"
        ))),
    }
}

/// Model dispatch errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Endpoint is not an absolute `http`/`https` URL.
    #[error("invalid model endpoint: {0}")]
    InvalidEndpoint(String),
    /// Model name is unusable.
    #[error("invalid model name: {0}")]
    InvalidModel(String),
    /// Service could not be reached or refused the request.
    #[error("model service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Reply was malformed or blank.
    #[error("empty model response: {0}")]
    EmptyResponse(String),
    /// Request body could not be serialized.
    #[error("request encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
