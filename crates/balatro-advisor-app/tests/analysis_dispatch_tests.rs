//! Integration tests for the capture -> dispatch -> display flow.

mod common;

use balatro_advisor_app::{ActionOutcome, perform_analysis};
use balatro_advisor_core::{AnalysisKind, GAME_STATE_PROMPT, HAND_PROMPT, SYSTEM_PROMPT};
use balatro_advisor_ui::{STATUS_COMPLETE, UiState};

#[test]
fn analysis_dispatch_tests_displays_reply_verbatim() {
    let service = common::ScriptedService::replying("Play the flush.");
    let client = common::client_for(&service);
    let grabber = common::test_app_grabber();
    let mut state = UiState::new("0.1.0");

    let outcome = perform_analysis(
        &mut state,
        &grabber,
        &client,
        "TestApp",
        AnalysisKind::Hand,
    );

    assert_eq!(outcome, ActionOutcome::Completed);
    assert_eq!(state.output(), "Play the flush.");
    assert_eq!(state.status_text(), STATUS_COMPLETE);
    assert_eq!(service.calls(), 1);
    assert_eq!(grabber.backend().resources().live(), 0);
}

#[test]
fn analysis_dispatch_tests_sends_kind_prompt_with_one_image() {
    let service = common::ScriptedService::replying("Reroll the shop.");
    let client = common::client_for(&service);
    let grabber = common::test_app_grabber();
    let mut state = UiState::new("0.1.0");

    perform_analysis(
        &mut state,
        &grabber,
        &client,
        "TestApp",
        AnalysisKind::GameState,
    );

    let body = service.last_body();
    assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["content"], GAME_STATE_PROMPT);
    assert_ne!(body["messages"][1]["content"], HAND_PROMPT);
    let images = body["messages"][1]["images"]
        .as_array()
        .expect("user message should carry images");
    assert_eq!(images.len(), 1);
    assert!(
        images[0]
            .as_str()
            .is_some_and(|image| image.starts_with("iVBORw0KGgo"))
    );
    assert_eq!(
        body["options"]["temperature"]
            .as_f64()
            .map(|t| (t * 10.0).round()),
        Some(7.0)
    );
}

#[test]
fn analysis_dispatch_tests_each_action_overwrites_previous_output() {
    let grabber = common::test_app_grabber();
    let mut state = UiState::new("0.1.0");

    let first = common::ScriptedService::replying("First advice.");
    perform_analysis(
        &mut state,
        &grabber,
        &common::client_for(&first),
        "TestApp",
        AnalysisKind::Hand,
    );
    let second = common::ScriptedService::replying("Second advice.");
    perform_analysis(
        &mut state,
        &grabber,
        &common::client_for(&second),
        "TestApp",
        AnalysisKind::Shop,
    );

    assert_eq!(state.output(), "Second advice.");
}
