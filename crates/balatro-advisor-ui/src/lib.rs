#![warn(missing_docs)]
//! # balatro-advisor-ui
//!
//! ## Purpose
//! Defines the UI-facing state model for `balatro-advisor`.
//!
//! ## Responsibilities
//! - Track the status line and the output pane text.
//! - Gate actions so that at most one analysis is in flight.
//!
//! ## Data flow
//! Button click -> [`UiState::begin_action`] -> analysis runs elsewhere ->
//! [`UiState::finish_success`] or [`UiState::finish_failure`] -> the shell
//! renders [`UiState::status_text`] and [`UiState::output`].
//!
//! ## Ownership and lifetimes
//! `UiState` owns all strings so the shell can re-render at any time without
//! borrowing from the worker that produced them.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Out-of-order
//! calls are ignored and reported through return values.

use balatro_advisor_core::AnalysisKind;

/// Status line shown before any action.
pub const STATUS_READY: &str = "Ready";
/// Status line after a successful analysis.
pub const STATUS_COMPLETE: &str = "Analysis complete";
/// Status line after a failed analysis.
pub const STATUS_ERROR: &str = "Error occurred";

/// Window title.
pub const APP_TITLE: &str = "Balatro Advisor";
/// Description line under the title.
pub const APP_DESCRIPTION: &str = "Analyze your Balatro game state and get strategic advice";

/// Status of the most recent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorStatus {
    /// No action has run yet.
    Ready,
    /// An analysis is in flight.
    Working(AnalysisKind),
    /// The last analysis produced text.
    Complete,
    /// The last analysis failed.
    Failed,
}

/// Aggregate UI runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    status: AdvisorStatus,
    output: String,
}

impl UiState {
    /// Creates default UI state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            status: AdvisorStatus::Ready,
            output: String::new(),
        }
    }

    /// Current status.
    pub fn status(&self) -> AdvisorStatus {
        self.status
    }

    /// Text currently shown in the output pane.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns `true` while an analysis is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self.status, AdvisorStatus::Working(_))
    }

    /// Starts an action.
    ///
    /// # Returns
    /// `false` without changing anything when another action is in flight.
    pub fn begin_action(&mut self, kind: AnalysisKind) -> bool {
        if self.is_busy() {
            return false;
        }
        self.status = AdvisorStatus::Working(kind);
        true
    }

    /// Shows the model reply verbatim.
    pub fn finish_success(&mut self, text: impl Into<String>) {
        self.output = text.into();
        self.status = AdvisorStatus::Complete;
    }

    /// Shows an error message.
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        self.output = message.into();
        self.status = AdvisorStatus::Failed;
    }

    /// Status line text.
    pub fn status_text(&self) -> &'static str {
        match self.status {
            AdvisorStatus::Ready => STATUS_READY,
            AdvisorStatus::Working(kind) => kind.working_status(),
            AdvisorStatus::Complete => STATUS_COMPLETE,
            AdvisorStatus::Failed => STATUS_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for UI state transitions.

    use super::*;

    #[test]
    fn second_action_is_refused_while_busy() {
        let mut state = UiState::new("0.1.0");
        assert!(state.begin_action(AnalysisKind::Hand));
        assert!(!state.begin_action(AnalysisKind::Shop));
        assert_eq!(state.status(), AdvisorStatus::Working(AnalysisKind::Hand));
        assert_eq!(state.status_text(), "Analyzing current hand...");

        state.finish_success("done");
        assert!(state.begin_action(AnalysisKind::Shop));
    }

    #[test]
    fn new_output_replaces_previous_output() {
        let mut state = UiState::new("0.1.0");
        assert_eq!(state.status_text(), STATUS_READY);

        state.begin_action(AnalysisKind::Hand);
        state.finish_success("first");
        state.begin_action(AnalysisKind::GameState);
        state.finish_failure("Error: second");

        assert_eq!(state.output(), "Error: second");
        assert_eq!(state.status_text(), STATUS_ERROR);
    }
}
