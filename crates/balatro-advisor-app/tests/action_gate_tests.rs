//! Integration tests for the one-action-at-a-time gate.

mod common;

use balatro_advisor_app::{ActionOutcome, perform_analysis};
use balatro_advisor_core::AnalysisKind;
use balatro_advisor_ui::{AdvisorStatus, UiState};

#[test]
fn action_gate_tests_ignores_click_while_busy() {
    let service = common::ScriptedService::replying("Play the flush.");
    let client = common::client_for(&service);
    let grabber = common::test_app_grabber();
    let mut state = UiState::new("0.1.0");

    assert!(state.begin_action(AnalysisKind::Hand));
    let outcome = perform_analysis(
        &mut state,
        &grabber,
        &client,
        "TestApp",
        AnalysisKind::Shop,
    );

    assert_eq!(outcome, ActionOutcome::Ignored);
    assert_eq!(state.status(), AdvisorStatus::Working(AnalysisKind::Hand));
    assert_eq!(service.calls(), 0);
    assert_eq!(grabber.backend().resources().acquired, 0);
}
