//! Progress reporting for pipeline runs
//!
//! The pipeline emits a [`ProgressEvent`] when a stage starts, after each
//! member it processes, and when the stage finishes. Observers receive the
//! events synchronously on the calling thread.
//!
//! # Example
//!
//! ```
//! use molpipe::core::{ProgressEvent, ProgressObserver};
//!
//! struct Printer;
//!
//! impl ProgressObserver for Printer {
//!     fn on_event(&self, event: &ProgressEvent) {
//!         if let ProgressEvent::StageFinished { stage, kept, .. } = event {
//!             println!("{}: {} kept", stage, kept);
//!         }
//!     }
//! }
//! ```

use crate::core::stage::OperationKind;

/// Events emitted while a pipeline runs
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A stage is about to process `total` members
    StageStarted {
        index: usize,
        stage: String,
        operation: OperationKind,
        total: usize,
    },
    /// One member has been handled by the current stage
    ItemProcessed {
        index: usize,
        stage: String,
        member: String,
    },
    /// The stage has handled every member
    StageFinished {
        index: usize,
        stage: String,
        kept: usize,
        dropped: usize,
        failed: usize,
    },
}

/// Receiver for progress events
///
/// This trait is object-safe and is passed around as `&dyn ProgressObserver`.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Observer that ignores every event
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<ProgressEvent>>>,
    }

    impl ProgressObserver for Recorder {
        fn on_event(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn started() -> ProgressEvent {
        ProgressEvent::StageStarted {
            index: 0,
            stage: "standardizer".to_string(),
            operation: OperationKind::TransformFilter,
            total: 3,
        }
    }

    #[test]
    fn test_noop_observer_accepts_events() {
        NoopObserver.on_event(&started());
    }

    #[test]
    fn test_observer_is_object_safe() {
        fn notify(observer: &dyn ProgressObserver) {
            observer.on_event(&started());
        }

        let recorder = Recorder::default();
        notify(&recorder);
        notify(&NoopObserver);

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.as_slice(), &[started()]);
    }
}
