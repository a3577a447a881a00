//! Test: Filtering - rejected members disappear, rejected singles stop the run

use crate::helpers::*;
use molpipe::core::{Item, Pipeline};

/// Surviving members keep their names and relative order
#[test]
fn test_collection_drops_rejected_members() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(RecordingStage::filter("small", &log).below(4.0))]);

    let output = pipeline.apply(scalars(&[1.0, 8.0, 3.0, 5.0, 2.0])).unwrap();

    assert_eq!(
        collected(&output),
        vec![("m0".to_string(), 1.0), ("m2".to_string(), 3.0), ("m4".to_string(), 2.0)]
    );
}

/// Dropped members are not seen by later stages
#[test]
fn test_later_stages_only_see_survivors() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::filter("small", &log).below(4.0)),
        Box::new(RecordingStage::transformer("double", &log)),
    ]);

    let output = pipeline.apply(scalars(&[1.0, 8.0])).unwrap();

    assert_eq!(collected(&output), vec![("m0".to_string(), 2.0)]);
    assert_eq!(calls(&log), vec!["small:filter", "small:filter", "double:transform"]);
}

/// A rejected single item is reported, not raised, and skips the remaining stages
#[test]
fn test_single_item_rejection() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::all("gate", &log).below(1.0)),
        Box::new(RecordingStage::transformer("never", &log)),
    ]);

    let run = pipeline.run(Item::single(scalar(5.0)), &molpipe::NoopObserver).unwrap();

    match &run.output {
        Item::Rejected { stage } => assert_eq!(stage, "gate"),
        other => panic!("Expected a rejection, got {:?}", other),
    }
    assert_eq!(calls(&log), vec!["gate:transform_filter"]);
    assert_eq!(run.report.stages.len(), 1);
    assert_eq!(run.report.stages[0].dropped, 1);
}

/// Filtering everything out leaves an empty collection
#[test]
fn test_everything_filtered() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::filter("none", &log).below(0.0)),
        Box::new(RecordingStage::transformer("double", &log)),
    ]);

    let run = pipeline.run(scalars(&[1.0, 2.0]), &molpipe::NoopObserver).unwrap();

    assert!(run.output.as_collection().unwrap().is_empty());
    assert_eq!(run.report.total_dropped(), 2);
    assert_eq!(run.report.stages[1].input, 0);
}
