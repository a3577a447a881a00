//! Test: Progress - observers see every stage and member

use crate::helpers::*;
use molpipe::core::{Item, OperationKind, Pipeline, ProgressEvent};

#[test]
fn test_events_follow_stage_order() {
    let log = call_log();
    let observer = RecordingObserver::default();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::filter("small", &log).below(5.0)),
        Box::new(RecordingStage::transformer("double", &log)),
    ]);

    pipeline.run(scalars(&[1.0, 9.0]), &observer).unwrap();

    let events = observer.events();
    assert_eq!(events.len(), 7);
    assert_eq!(
        events[0],
        ProgressEvent::StageStarted {
            index: 0,
            stage: "small".to_string(),
            operation: OperationKind::Filter,
            total: 2,
        }
    );
    assert_eq!(
        events[2],
        ProgressEvent::ItemProcessed {
            index: 0,
            stage: "small".to_string(),
            member: "m1".to_string(),
        }
    );
    assert_eq!(
        events[3],
        ProgressEvent::StageFinished {
            index: 0,
            stage: "small".to_string(),
            kept: 1,
            dropped: 1,
            failed: 0,
        }
    );
    // Only the survivor reaches the second stage
    assert!(matches!(&events[4], ProgressEvent::StageStarted { index: 1, total: 1, .. }));
    assert!(matches!(&events[6], ProgressEvent::StageFinished { index: 1, kept: 1, .. }));
}

#[test]
fn test_no_events_after_rejection() {
    let log = call_log();
    let observer = RecordingObserver::default();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::filter("gate", &log).below(0.0)),
        Box::new(RecordingStage::transformer("never", &log)),
    ]);

    let output = pipeline.run(Item::single(scalar(1.0)), &observer).unwrap().output;

    assert!(output.is_rejected());
    assert!(observer
        .events()
        .iter()
        .all(|e| !matches!(e, ProgressEvent::StageStarted { stage, .. } if stage == "never")));
}

#[test]
fn test_report_timestamps() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(RecordingStage::transformer("double", &log))]);

    let report = pipeline.run(scalars(&[1.0]), &molpipe::NoopObserver).unwrap().report;

    assert_eq!(report.status, molpipe::core::RunStatus::Completed);
    assert!(report.started_at.is_some());
    assert!(report.completed_at >= report.started_at);
    assert!(report.duration().is_some());
}
