//! Thread-local recording context
//!
//! A recording installs a buffer as the current recorder; operations and
//! measurements queued while it is installed land in that buffer in creation
//! order. The guard clears the context on every exit path, panics included.

use crate::{Measurement, Operation, Result, TapeError};
use std::cell::RefCell;

#[derive(Debug, Default)]
pub(crate) struct Recorded {
    pub(crate) operations: Vec<Operation>,
    pub(crate) measurements: Vec<Measurement>,
}

thread_local! {
    static ACTIVE: RefCell<Option<Recorded>> = const { RefCell::new(None) };
}

/// Scope of an open recording
///
/// Dropping the guard without calling [`RecordingGuard::finish`] discards
/// whatever was queued.
#[derive(Debug)]
pub(crate) struct RecordingGuard {
    _private: (),
}

impl RecordingGuard {
    /// Open a recording on this thread
    pub(crate) fn begin() -> Result<Self> {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.is_some() {
                return Err(TapeError::NestedRecording);
            }
            *active = Some(Recorded::default());
            Ok(Self { _private: () })
        })
    }

    /// Close the recording and take its contents
    pub(crate) fn finish(self) -> Recorded {
        ACTIVE.with(|active| active.borrow_mut().take().unwrap_or_default())
    }
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread teardown
        let _ = ACTIVE.try_with(|active| {
            if let Ok(mut active) = active.try_borrow_mut() {
                active.take();
            }
        });
    }
}

/// Whether a recording is open on this thread
pub fn is_recording() -> bool {
    ACTIVE.with(|active| active.borrow().is_some())
}

pub(crate) fn push_operation(op: Operation) {
    ACTIVE.with(|active| match active.borrow_mut().as_mut() {
        Some(recorded) => recorded.operations.push(op),
        None => tracing::trace!(op = %op, "no active recording, operation not queued"),
    });
}

pub(crate) fn push_measurement(m: Measurement) {
    ACTIVE.with(|active| match active.borrow_mut().as_mut() {
        Some(recorded) => recorded.measurements.push(m),
        None => tracing::trace!(measurement = %m, "no active recording, measurement not queued"),
    });
}
