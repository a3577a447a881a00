//! Test: Dispatch Priority - one operation per stage, richest first

use crate::helpers::*;
use molpipe::core::{Item, OperationKind, Pipeline, PipelineError, Series};

/// A stage with every capability is only ever asked to transform-filter
#[test]
fn test_transform_filter_wins() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(RecordingStage::all("s", &log).below(5.0))]);

    let output = pipeline.apply(scalars(&[1.0, 7.0])).unwrap();

    assert_eq!(collected(&output), vec![("m0".to_string(), 2.0)]);
    assert_eq!(calls(&log), vec!["s:transform_filter", "s:transform_filter"]);
}

/// Filter is preferred over transform, so values pass through unchanged
#[test]
fn test_filter_preferred_over_transform() {
    let log = call_log();
    let stage = RecordingStage::new("s", caps(false, true, true), &log).below(5.0);
    let pipeline = Pipeline::new(vec![Box::new(stage)]);

    let output = pipeline.apply(scalars(&[1.0, 3.0, 9.0])).unwrap();

    assert_eq!(collected(&output), vec![("m0".to_string(), 1.0), ("m1".to_string(), 3.0)]);
    assert!(calls(&log).iter().all(|c| c == "s:filter"));
}

#[test]
fn test_transform_only() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(RecordingStage::transformer("s", &log).factor(10.0))]);

    let output = pipeline.apply(Item::single(scalar(1.5))).unwrap();

    assert_eq!(read_scalar(output.as_single().unwrap()), 15.0);
    assert_eq!(calls(&log), vec!["s:transform"]);
}

/// A stage without any capability aborts the run before touching data
#[test]
fn test_stage_without_capability_errors() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::transformer("first", &log)),
        Box::new(RecordingStage::new("inert", caps(false, false, false), &log)),
    ]);

    let err = pipeline.apply(scalars(&[1.0])).unwrap_err();

    match &err {
        PipelineError::Capability { stage } => assert_eq!(stage, "inert"),
        other => panic!("Expected a capability error, got {:?}", other),
    }
    assert!(err.to_string().contains("inert"));
    assert_eq!(calls(&log), vec!["first:transform"]);
}

#[test]
fn test_capability_checked_on_empty_collection() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(RecordingStage::new("inert", caps(false, false, false), &log))]);

    let result = pipeline.apply(Item::collection(Series::new()));
    assert!(matches!(result, Err(PipelineError::Capability { .. })));
}

/// Stages apply in order and the report records the resolved operation
#[test]
fn test_stages_apply_in_order() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::transformer("double", &log)),
        Box::new(RecordingStage::filter("small", &log).below(5.0)),
        Box::new(RecordingStage::all("triple", &log).factor(3.0)),
    ])
    .with_name("ordered");

    let run = pipeline.run(Item::single(scalar(2.0)), &molpipe::NoopObserver).unwrap();

    assert_eq!(read_scalar(run.output.as_single().unwrap()), 12.0);
    assert_eq!(calls(&log), vec!["double:transform", "small:filter", "triple:transform_filter"]);

    let operations: Vec<OperationKind> = run.report.stages.iter().map(|s| s.operation).collect();
    assert_eq!(
        operations,
        vec![OperationKind::Transform, OperationKind::Filter, OperationKind::TransformFilter]
    );
    assert_eq!(run.report.pipeline, "ordered");
}
