#![warn(missing_docs)]
//! # balatro-advisor-app
//!
//! ## Purpose
//! Orchestrates capture, encoding, model dispatch, and UI state for
//! `balatro-advisor`.
//!
//! ## Responsibilities
//! - Run one analysis: capture the game window, encode it, ask the model.
//! - Classify every failure into [`ErrorKind`] and a deterministic message.
//! - Project results into [`UiState`] at the action boundary.
//! - Load configuration and set up per-run logging.
//! - Run analyses off the UI thread through [`worker::AnalysisWorker`].
//!
//! ## Data flow
//! Button -> [`UiState::begin_action`] -> [`run_analysis`] (capture ->
//! [`AnalysisRequest::encode`] -> [`ModelClient::analyze`]) ->
//! [`apply_analysis_result`] -> shell re-renders status and output.
//!
//! ## Ownership and lifetimes
//! The frame is moved into the request and dropped once encoded. Results are
//! owned strings so they can cross from the worker thread to the UI thread.
//!
//! ## Error model
//! Layer errors convert into [`AdvisorError`]. Nothing propagates past
//! [`apply_analysis_result`]; errors end up as output pane text.

pub mod config;
pub mod logging;
pub mod worker;

use std::sync::Arc;
use std::time::Instant;

use balatro_advisor_capture::{CaptureError, FrameGrabber, native_frame_grabber};
use balatro_advisor_core::{AnalysisKind, AnalysisRequest, CoreError};
use balatro_advisor_model::{HttpModelTransport, ModelClient, ModelError};
use balatro_advisor_ui::UiState;
use thiserror::Error;
use tracing::{info, warn};

pub use config::AdvisorConfig;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("BALATRO_ADVISOR_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Error categories shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Game window is not open.
    WindowNotFound,
    /// OS drawing calls failed.
    CaptureBackend,
    /// Screenshot could not be encoded.
    Encode,
    /// Model service unreachable or refused the request.
    ServiceUnavailable,
    /// Model returned nothing usable.
    EmptyResponse,
    /// Endpoint or model settings are invalid.
    Configuration,
    /// The background analysis thread is gone.
    Worker,
}

/// Outcome of one user action after projection into UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Reply text was displayed.
    Completed,
    /// An error message was displayed.
    Failed(ErrorKind),
    /// Another action was in flight; nothing ran.
    Ignored,
}

/// Builds the production model client from configuration.
///
/// # Errors
/// Returns [`AdvisorError::Configuration`] for an invalid endpoint or model.
pub fn model_client_from_config(config: &AdvisorConfig) -> Result<ModelClient, AdvisorError> {
    let transport = Arc::new(HttpModelTransport::new(config.request_timeout));
    Ok(ModelClient::new(
        config.endpoint.clone(),
        config.model.clone(),
        transport,
    )?)
}

/// Captures the window, encodes it, and asks the model for `kind` advice.
///
/// # Errors
/// Returns the first failure, classified as an [`AdvisorError`].
pub fn run_analysis(
    grabber: &dyn FrameGrabber,
    client: &ModelClient,
    window_title: &str,
    kind: AnalysisKind,
) -> Result<String, AdvisorError> {
    let started = Instant::now();
    info!(kind = kind.as_str(), window_title, "analysis started");

    let frame = grabber.grab(window_title)?;
    let encoded = AnalysisRequest::for_kind(frame, kind).encode()?;
    let reply = client.analyze(&encoded)?;

    info!(
        kind = kind.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "analysis finished"
    );
    Ok(reply)
}

/// Runs one analysis against the live desktop and the configured model.
///
/// # Errors
/// Same as [`run_analysis`], plus [`AdvisorError::Configuration`] for invalid
/// settings and [`AdvisorError::CaptureBackend`] where no native capture exists.
pub fn run_configured_analysis(
    config: &AdvisorConfig,
    kind: AnalysisKind,
) -> Result<String, AdvisorError> {
    let grabber = native_frame_grabber()?;
    let client = model_client_from_config(config)?;
    run_analysis(grabber.as_ref(), &client, &config.window_title, kind)
}

/// Writes an analysis result into UI state.
///
/// Successful replies are shown verbatim; errors are shown as
/// [`AdvisorError::user_message`].
pub fn apply_analysis_result(
    state: &mut UiState,
    result: Result<String, AdvisorError>,
) -> ActionOutcome {
    match result {
        Ok(text) => {
            state.finish_success(text);
            ActionOutcome::Completed
        }
        Err(error) => {
            warn!(kind = ?error.kind(), error = %error, "analysis failed");
            state.finish_failure(error.user_message());
            ActionOutcome::Failed(error.kind())
        }
    }
}

/// Runs one action synchronously from click to displayed result.
pub fn perform_analysis(
    state: &mut UiState,
    grabber: &dyn FrameGrabber,
    client: &ModelClient,
    window_title: &str,
    kind: AnalysisKind,
) -> ActionOutcome {
    if !state.begin_action(kind) {
        info!(kind = kind.as_str(), "action ignored while another is running");
        return ActionOutcome::Ignored;
    }

    let result = run_analysis(grabber, client, window_title, kind);
    apply_analysis_result(state, result)
}

/// Converts `\n` line breaks to `\r\n` for native multi-line edit controls.
pub fn to_crlf(text: &str) -> String {
    let mut converted = String::with_capacity(text.len() + text.len() / 16);
    let mut previous = '\0';
    for ch in text.chars() {
        if ch == '\n' && previous != '\r' {
            converted.push('\r');
        }
        converted.push(ch);
        previous = ch;
    }
    converted
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// Game window is not open.
    #[error("window not found: {title}")]
    WindowNotFound {
        /// Title that was searched for.
        title: String,
    },
    /// OS drawing calls failed.
    #[error("capture backend error: {0}")]
    CaptureBackend(String),
    /// Screenshot encoding failed.
    #[error("encode error: {0}")]
    Encode(String),
    /// Model service unreachable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Model reply unusable.
    #[error("empty response: {0}")]
    EmptyResponse(String),
    /// Invalid endpoint or model configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Background analysis thread could not run the request.
    #[error("analysis worker error: {0}")]
    Worker(String),
}

impl AdvisorError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdvisorError::WindowNotFound { .. } => ErrorKind::WindowNotFound,
            AdvisorError::CaptureBackend(_) => ErrorKind::CaptureBackend,
            AdvisorError::Encode(_) => ErrorKind::Encode,
            AdvisorError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            AdvisorError::EmptyResponse(_) => ErrorKind::EmptyResponse,
            AdvisorError::Configuration(_) => ErrorKind::Configuration,
            AdvisorError::Worker(_) => ErrorKind::Worker,
        }
    }

    /// Message written into the output pane.
    pub fn user_message(&self) -> String {
        match self {
            AdvisorError::WindowNotFound { title } => {
                format!("Error: game window not found (title \"{title}\")")
            }
            AdvisorError::CaptureBackend(detail) => {
                format!("Error: failed to capture game window: {detail}")
            }
            AdvisorError::Encode(detail) => {
                format!("Error: failed to encode screenshot: {detail}")
            }
            AdvisorError::ServiceUnavailable(detail) => {
                format!("Error: model service unavailable: {detail}")
            }
            AdvisorError::EmptyResponse(_) => "Error: model returned an empty response".to_string(),
            AdvisorError::Configuration(detail) => {
                format!("Error: invalid model configuration: {detail}")
            }
            AdvisorError::Worker(detail) => format!("Error: analysis worker stopped: {detail}"),
        }
    }
}

impl From<CaptureError> for AdvisorError {
    fn from(error: CaptureError) -> Self {
        match error {
            CaptureError::WindowNotFound(title) => AdvisorError::WindowNotFound { title },
            CaptureError::Backend(detail) => AdvisorError::CaptureBackend(detail),
        }
    }
}

impl From<CoreError> for AdvisorError {
    fn from(error: CoreError) -> Self {
        AdvisorError::Encode(error.to_string())
    }
}

impl From<ModelError> for AdvisorError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::InvalidEndpoint(detail) | ModelError::InvalidModel(detail) => {
                AdvisorError::Configuration(detail)
            }
            ModelError::ServiceUnavailable(detail) => AdvisorError::ServiceUnavailable(detail),
            ModelError::EmptyResponse(detail) => AdvisorError::EmptyResponse(detail),
            ModelError::Encode(error) => AdvisorError::Encode(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error classification and text conversion.

    use super::*;

    #[test]
    fn empty_response_message_hides_detail() {
        let error = AdvisorError::from(ModelError::EmptyResponse("blank".to_string()));
        assert_eq!(error.kind(), ErrorKind::EmptyResponse);
        assert_eq!(error.user_message(), "Error: model returned an empty response");
    }

    #[test]
    fn capture_errors_keep_their_category() {
        let missing = AdvisorError::from(CaptureError::WindowNotFound("Balatro".to_string()));
        let backend = AdvisorError::from(CaptureError::Backend("BitBlt failed".to_string()));
        assert_eq!(missing.kind(), ErrorKind::WindowNotFound);
        assert_eq!(backend.kind(), ErrorKind::CaptureBackend);
        assert!(backend.user_message().ends_with("BitBlt failed"));
    }

    #[test]
    fn worker_failure_is_not_reported_as_capture_failure() {
        let error = AdvisorError::Worker("analysis thread is not running".to_string());
        assert_eq!(error.kind(), ErrorKind::Worker);
        assert_eq!(
            error.user_message(),
            "Error: analysis worker stopped: analysis thread is not running"
        );
    }

    #[test]
    fn crlf_conversion_is_idempotent() {
        assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
        assert_eq!(to_crlf(&to_crlf("x\n\ny")), "x\r\n\r\ny");
    }
}
