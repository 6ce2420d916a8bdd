//! Background analysis worker.
//!
//! One thread runs queued analyses in order and hands results back through a
//! channel. The owner is told about new results through a notify callback,
//! which the Win32 shell maps to a posted window message.
//!
//! Dropping or detaching the worker never waits for an in-flight analysis:
//! the thread finishes its current job, fails to deliver the result, and
//! exits on its own.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use balatro_advisor_core::AnalysisKind;
use tracing::{info, warn};

use crate::AdvisorError;

/// Result of one queued analysis.
#[derive(Debug)]
pub struct WorkerEvent {
    /// Analysis that produced the result.
    pub kind: AnalysisKind,
    /// Reply text or classified failure.
    pub result: Result<String, AdvisorError>,
}

/// Handle to the analysis thread.
pub struct AnalysisWorker {
    command_tx: Sender<AnalysisKind>,
    event_rx: Receiver<WorkerEvent>,
    _thread: JoinHandle<()>,
}

impl AnalysisWorker {
    /// Starts the worker thread.
    ///
    /// `job` runs once per submitted kind. `notify` runs after each result is
    /// queued for [`AnalysisWorker::drain`].
    ///
    /// # Errors
    /// Returns [`AdvisorError::Worker`] when the thread cannot be spawned.
    pub fn spawn<J, N>(job: J, notify: N) -> Result<Self, AdvisorError>
    where
        J: Fn(AnalysisKind) -> Result<String, AdvisorError> + Send + 'static,
        N: Fn() + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<AnalysisKind>();
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>();

        let thread = std::thread::Builder::new()
            .name("balatro-advisor-analysis".to_string())
            .spawn(move || {
                while let Ok(kind) = command_rx.recv() {
                    let result = job(kind);
                    if event_tx.send(WorkerEvent { kind, result }).is_err() {
                        break;
                    }
                    notify();
                }
                info!("analysis worker exiting");
            })
            .map_err(|error| {
                AdvisorError::Worker(format!("failed to spawn analysis thread: {error}"))
            })?;

        info!("analysis worker spawned");
        Ok(Self {
            command_tx,
            event_rx,
            _thread: thread,
        })
    }

    /// Queues one analysis.
    ///
    /// # Errors
    /// Returns [`AdvisorError::Worker`] when the thread has stopped.
    pub fn submit(&self, kind: AnalysisKind) -> Result<(), AdvisorError> {
        self.command_tx
            .send(kind)
            .map_err(|_| AdvisorError::Worker("analysis thread is not running".to_string()))
    }

    /// Takes every result delivered so far.
    ///
    /// # Errors
    /// Returns [`AdvisorError::Worker`] when nothing is pending and the thread
    /// has stopped.
    pub fn drain(&self) -> Result<Vec<WorkerEvent>, AdvisorError> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return Ok(events),
                Err(TryRecvError::Disconnected) if events.is_empty() => {
                    warn!("analysis worker channel disconnected");
                    return Err(AdvisorError::Worker(
                        "analysis thread stopped unexpectedly".to_string(),
                    ));
                }
                Err(TryRecvError::Disconnected) => return Ok(events),
            }
        }
    }

    /// Releases the worker without waiting for an in-flight analysis.
    pub fn detach(self) {
        info!("analysis worker detached");
    }
}
