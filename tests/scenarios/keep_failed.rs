//! Test: Keep Failed - stage errors either abort the run or become failure markers

use crate::helpers::*;
use molpipe::core::{Item, Pipeline, PipelineError, Series, StageOptions, Value};
use molpipe::stages::{
    ForceField, ForceFieldConfig, ForceFieldKind, MorganFeaturizer, OrganicFilter, Standardizer,
};
use molpipe::Molecule;

/// Without keep_failed the first error aborts the whole run
#[test]
fn test_error_aborts_run() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::transformer("fragile", &log).failing_on(2.0)),
        Box::new(RecordingStage::transformer("after", &log)),
    ]);

    let err = pipeline.apply(scalars(&[1.0, 2.0, 3.0])).unwrap_err();

    match &err {
        PipelineError::Stage { stage, member, .. } => {
            assert_eq!(stage, "fragile");
            assert_eq!(member.as_deref(), Some("m1"));
        }
        other => panic!("Expected a stage error, got {:?}", other),
    }
    assert!(err.to_string().contains("member 'm1'"));
    assert!(!calls(&log).iter().any(|c| c.starts_with("after")));
}

#[test]
fn test_error_on_single_item() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(RecordingStage::all("fragile", &log).failing_on(1.0))]);

    let err = pipeline.apply(Item::single(scalar(1.0))).unwrap_err();

    assert!(matches!(err, PipelineError::Stage { member: None, .. }));
    assert!(err.to_string().contains("on item"));
}

/// With keep_failed the member stays in place as a failure marker
#[test]
fn test_failure_marker_kept_in_place() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::transformer("fragile", &log).failing_on(2.0).keep_failed()),
        Box::new(RecordingStage::transformer("after", &log)),
    ]);

    let run = pipeline.run(scalars(&[1.0, 2.0, 3.0]), &molpipe::NoopObserver).unwrap();
    let series = run.output.as_collection().unwrap();

    assert_eq!(series.names().collect::<Vec<_>>(), vec!["m0", "m1", "m2"]);
    match series.get("m1").unwrap() {
        Value::Failed(failure) => {
            assert_eq!(failure.stage, "fragile");
            assert!(failure.reason.contains("cannot handle 2"));
            assert_eq!(failure.input, None);
        }
        other => panic!("Expected a failure marker, got {:?}", other),
    }
    assert_eq!(read_scalar(series.get("m2").unwrap()), 12.0);

    // The marker is passed through later stages without being processed
    assert_eq!(calls(&log).iter().filter(|c| c.starts_with("after")).count(), 2);
    assert_eq!(run.report.stages[0].failed, 1);
    assert_eq!(run.report.stages[1].skipped, 1);
    assert_eq!(run.report.total_failed(), 1);
}

/// Failed rows tabulate as NaN so the frame keeps its shape
#[test]
fn test_failed_rows_in_frame() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![Box::new(
        RecordingStage::transformer("fragile", &log).failing_on(2.0).keep_failed(),
    )]);

    let output = pipeline.apply(scalars(&[1.0, 2.0])).unwrap();
    let frame = output.to_frame().unwrap();

    assert_eq!(frame.shape(), (2, 1));
    assert_eq!(frame.failed, vec![false, true]);
    assert!(frame.row("m1").unwrap()[0].is_nan());
}

/// A molecule the force field has no parameters for is recorded with its SMILES
#[test]
fn test_failure_records_input_smiles() {
    let mut series = Series::new();
    series.push("ethanol", Value::Mol(Molecule::from_smiles("CCO").unwrap()));
    series.push("borane", Value::Mol(Molecule::from_smiles("CB(C)C").unwrap()));

    let mmff = ForceFieldConfig {
        forcefield: ForceFieldKind::Mmff,
        ..Default::default()
    };
    let pipeline = Pipeline::new(vec![
        Box::new(ForceField::new(mmff).with_options(StageOptions::keep_failed())),
        Box::new(MorganFeaturizer::default()),
    ]);
    let output = pipeline.apply(Item::collection(series)).unwrap();
    let series = output.as_collection().unwrap();

    assert!(matches!(series.get("ethanol"), Some(Value::Vector(_))));
    match series.get("borane") {
        Some(Value::Failed(failure)) => {
            assert_eq!(failure.stage, "forcefield");
            assert!(failure.reason.contains("'B'"));
            assert!(failure.input.as_deref().unwrap().contains('B'));
        }
        other => panic!("Expected a failure marker, got {:?}", other),
    }
}

/// Without keep_failed a molecule that cannot be standardized is dropped
#[test]
fn test_standardizer_drops_by_default() {
    let mut series = Series::new();
    series.push("ethanol", Value::Mol(Molecule::from_smiles("CCO").unwrap()));
    series.push("empty", Value::Mol(Molecule::new()));

    let pipeline = Pipeline::new(vec![Box::new(Standardizer::default())]);
    let output = pipeline.apply(Item::collection(series)).unwrap();

    assert_eq!(output.as_collection().unwrap().names().collect::<Vec<_>>(), vec!["ethanol"]);
}

/// Solvent-only and salt-only molecules survive standardization unchanged
#[test]
fn test_solvents_pass_standardizer() {
    let mut series = Series::new();
    for (name, smiles) in [("ethanol", "CCO"), ("water", "O"), ("brine", "[Na+].[Cl-]")] {
        series.push(name, Value::Mol(Molecule::from_smiles(smiles).unwrap()));
    }

    let pipeline = Pipeline::new(vec![Box::new(Standardizer::default())]);
    let run = pipeline.run(Item::collection(series), &molpipe::NoopObserver).unwrap();
    let series = run.output.as_collection().unwrap();

    assert_eq!(series.names().collect::<Vec<_>>(), vec!["ethanol", "water", "brine"]);
    assert_eq!(series.get("ethanol").and_then(|v| v.as_mol()).unwrap().to_smiles(), "CCO");
    assert_eq!(series.get("water").and_then(|v| v.as_mol()).unwrap().to_smiles(), "O");
    assert_eq!(run.report.total_dropped(), 0);
}

/// A keep_failed filter flags rejected members instead of dropping them
#[test]
fn test_keep_failed_filter_flags_rejections() {
    let log = call_log();
    let pipeline = Pipeline::new(vec![
        Box::new(RecordingStage::filter("small", &log).below(4.0).keep_failed()),
        Box::new(RecordingStage::transformer("after", &log)),
    ]);

    let run = pipeline.run(scalars(&[1.0, 8.0, 3.0]), &molpipe::NoopObserver).unwrap();
    let series = run.output.as_collection().unwrap();

    assert_eq!(series.names().collect::<Vec<_>>(), vec!["m0", "m1", "m2"]);
    match series.get("m1").unwrap() {
        Value::Failed(failure) => {
            assert_eq!(failure.stage, "small");
            assert!(failure.reason.contains("rejected"));
        }
        other => panic!("Expected a failure marker, got {:?}", other),
    }
    assert_eq!(read_scalar(series.get("m2").unwrap()), 6.0);
    assert_eq!(run.report.stages[0].failed, 1);
    assert_eq!(run.report.stages[0].dropped, 0);
    assert_eq!(run.report.stages[1].skipped, 1);
}

/// Inorganic molecules rejected by a keep_failed organic filter keep their SMILES
#[test]
fn test_keep_failed_organic_filter() {
    let mut series = Series::new();
    for (name, smiles) in [("methane", "C"), ("silane", "[SiH4]"), ("ethanol", "CCO")] {
        series.push(name, Value::Mol(Molecule::from_smiles(smiles).unwrap()));
    }

    let pipeline = Pipeline::new(vec![Box::new(OrganicFilter::new().with_options(StageOptions::keep_failed()))]);
    let output = pipeline.apply(Item::collection(series)).unwrap();
    let series = output.as_collection().unwrap();

    assert_eq!(series.len(), 3);
    assert_eq!(series.failed_count(), 1);
    match series.get("silane") {
        Some(Value::Failed(failure)) => {
            assert_eq!(failure.stage, "organic_filter");
            assert!(failure.input.as_deref().unwrap().contains("Si"));
        }
        other => panic!("Expected a failure marker, got {:?}", other),
    }
    assert!(matches!(series.get("methane"), Some(Value::Mol(_))));
}
