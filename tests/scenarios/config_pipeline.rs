//! Test: Config Pipeline - YAML definition plus a SMILES file

use molpipe::core::{Item, PipelineConfig, Value};
use molpipe::io::read_smiles;
use std::io::Write;

const PIPELINE_YAML: &str = r#"
name: "fingerprints"
description: "Standardize and fingerprint a small library"
input:
  location: "unused.smi"
  name_column: 1
stages:
  - type: standardizer
  - name: "small"
    type: atom_number_filter
    below: 12
  - type: morgan_featurizer
    n_feats: 512
"#;

#[tokio::test]
async fn test_yaml_pipeline_over_smiles_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# library").unwrap();
    writeln!(file, "CCO ethanol").unwrap();
    writeln!(file, "CC(=O)Oc1ccccc1C(=O)O aspirin").unwrap();
    writeln!(file, "CC(=O)[O-].[Na+] acetate").unwrap();

    let config = PipelineConfig::from_yaml(PIPELINE_YAML).unwrap();
    let read = config.input.as_ref().unwrap().read.clone();
    let series = read_smiles(file.path().to_str().unwrap(), &read).await.unwrap();

    let run = config
        .to_pipeline()
        .run(Item::collection(series), &molpipe::NoopObserver)
        .unwrap();

    // aspirin has 13 heavy atoms and is filtered out
    let frame = run.output.to_frame().unwrap();
    assert_eq!(frame.index, vec!["ethanol", "acetate"]);
    assert_eq!(frame.shape(), (2, 512));

    assert_eq!(run.report.pipeline, "fingerprints");
    let names: Vec<&str> = run.report.stages.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(names, vec!["standardizer", "small", "morgan"]);
    assert_eq!(run.report.stages[1].dropped, 1);
}

#[test]
fn test_unknown_stage_type_is_rejected() {
    let yaml = r#"
stages:
  - type: teleporter
"#;
    assert!(PipelineConfig::from_yaml(yaml).is_err());
}

#[test]
fn test_keep_failed_from_yaml() {
    let yaml = r#"
stages:
  - type: organic_filter
    keep_failed: true
"#;
    let pipeline = PipelineConfig::from_yaml(yaml).unwrap().to_pipeline();
    let mol = molpipe::Molecule::from_smiles("C[Sn](C)(C)C").unwrap();

    let output = pipeline.apply(Item::single(mol)).unwrap();
    match output.as_single() {
        Some(Value::Failed(failure)) => {
            assert_eq!(failure.stage, "organic_filter");
            assert_eq!(failure.reason, "rejected by filter");
        }
        other => panic!("Expected a failure marker, got {:?}", other),
    }
}
