//! Test: Notebook - standardize, optimize, filter and fingerprint

use molpipe::core::{Item, Pipeline, Series, StageOptions, Value};
use molpipe::stages::{ForceField, MorganFeaturizer, OrganicFilter, Standardizer};
use molpipe::Molecule;

const MOLECULES: [(&str, &str); 5] = [
    ("ethanol", "CCO"),
    ("phenol", "c1ccccc1O"),
    ("aspirin", "CC(=O)Oc1ccccc1C(=O)O"),
    ("sodium_acetate", "CC(=O)[O-].[Na+]"),
    ("triethylamine", "CCN(CC)CC"),
];

fn notebook_pipeline() -> Pipeline {
    Pipeline::new(vec![
        Box::new(Standardizer::default().with_options(StageOptions::keep_failed())),
        Box::new(ForceField::default()),
        Box::new(OrganicFilter::new()),
        Box::new(MorganFeaturizer::default()),
    ])
}

/// A salt goes in, a 2048-long fingerprint indexed 0..2047 comes out
#[test]
fn test_single_molecule_to_fingerprint() {
    let mol = Molecule::from_smiles("CC(=O)[O-].[Na+]").unwrap();

    let output = notebook_pipeline().apply(Item::single(mol)).unwrap();

    let fingerprint = match output.as_single() {
        Some(Value::Vector(v)) => v,
        other => panic!("Expected a vector, got {:?}", other),
    };
    assert_eq!(fingerprint.len(), 2048);
    assert_eq!(fingerprint.label(0), "0");
    assert_eq!(fingerprint.label(2047), "2047");
    assert!(fingerprint.count_nonzero() > 0);
    assert!(fingerprint.values.iter().all(|v| *v == 0.0 || *v == 1.0));
}

/// A named collection becomes a table with one row per molecule, in input order
#[test]
fn test_collection_to_frame() {
    let series: Series = MOLECULES
        .iter()
        .map(|(name, smiles)| (*name, Value::Mol(Molecule::from_smiles(smiles).unwrap())))
        .collect();

    let output = notebook_pipeline().apply(Item::collection(series)).unwrap();
    let frame = output.to_frame().unwrap();

    assert_eq!(frame.shape(), (5, 2048));
    assert_eq!(frame.index, MOLECULES.iter().map(|(name, _)| name.to_string()).collect::<Vec<_>>());
    assert_eq!(frame.columns[2047], "2047");
    assert!(frame.failed.iter().all(|failed| !failed));
}

/// The salt form and the parent acid share a fingerprint after standardization
#[test]
fn test_salt_matches_parent() {
    let pipeline = Pipeline::new(vec![Box::new(Standardizer::default()), Box::new(MorganFeaturizer::default())]);

    let salt = pipeline
        .apply(Item::single(Molecule::from_smiles("CC(=O)[O-].[Na+]").unwrap()))
        .unwrap();
    let acid = pipeline
        .apply(Item::single(Molecule::from_smiles("CC(=O)O").unwrap()))
        .unwrap();

    assert_eq!(salt.as_single(), acid.as_single());
}

/// Inorganic molecules are filtered out of a collection
#[test]
fn test_inorganic_filtered() {
    let series: Series = [("methane", "C"), ("silane", "[SiH4]"), ("ethanol", "CCO")]
        .iter()
        .map(|(name, smiles)| (*name, Value::Mol(Molecule::from_smiles(smiles).unwrap())))
        .collect();

    let output = Pipeline::new(vec![Box::new(OrganicFilter::new())])
        .apply(Item::collection(series))
        .unwrap();

    assert_eq!(
        output.as_collection().unwrap().names().collect::<Vec<_>>(),
        vec!["methane", "ethanol"]
    );
}
