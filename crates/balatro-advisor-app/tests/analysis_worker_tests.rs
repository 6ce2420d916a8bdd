//! Integration tests for the background analysis worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use balatro_advisor_app::worker::AnalysisWorker;
use balatro_advisor_app::{AdvisorError, ErrorKind, apply_analysis_result};
use balatro_advisor_core::AnalysisKind;
use balatro_advisor_ui::{STATUS_ERROR, UiState};

#[test]
fn analysis_worker_tests_detach_does_not_wait_for_slow_analysis() {
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let finished = Arc::new(AtomicBool::new(false));
    let finished_in_job = finished.clone();

    let worker = AnalysisWorker::spawn(
        move |_kind| {
            let _ = started_tx.send(());
            let _ = release_rx
                .lock()
                .expect("release lock should work")
                .recv_timeout(Duration::from_secs(10));
            finished_in_job.store(true, Ordering::SeqCst);
            Ok("late reply".to_string())
        },
        || {},
    )
    .expect("worker should spawn");

    worker.submit(AnalysisKind::Shop).expect("submit should work");
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("analysis should start");

    worker.detach();
    assert!(
        !finished.load(Ordering::SeqCst),
        "detach returned while the analysis was still running"
    );

    let _ = release_tx.send(());
}

#[test]
fn analysis_worker_tests_dead_worker_reports_worker_error() {
    let worker = AnalysisWorker::spawn(
        |_kind| -> Result<String, AdvisorError> { panic!("analysis thread crashed") },
        || {},
    )
    .expect("worker should spawn");

    worker.submit(AnalysisKind::Hand).expect("submit should work");

    let mut drained = None;
    for _ in 0..500 {
        match worker.drain() {
            Ok(events) => {
                assert!(events.is_empty());
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(error) => {
                drained = Some(error);
                break;
            }
        }
    }
    let error = drained.expect("drain should report the stopped thread");
    assert_eq!(error.kind(), ErrorKind::Worker);

    let Err(error) = worker.submit(AnalysisKind::Shop) else {
        panic!("submit to a stopped worker should fail");
    };
    assert_eq!(error.kind(), ErrorKind::Worker);

    let mut state = UiState::new("0.1.0");
    state.begin_action(AnalysisKind::Shop);
    apply_analysis_result(&mut state, Err(error));
    assert_eq!(state.status_text(), STATUS_ERROR);
    assert!(state.output().starts_with("Error: analysis worker stopped:"));
    assert!(!state.output().contains("capture"));
}
