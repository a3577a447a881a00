//! molpipe - cheminformatics pipelines over SMILES input
//!
//! A [`Pipeline`] is an ordered sequence of stages. Each stage advertises
//! what it can do (transform, filter, or both at once) and the pipeline
//! picks the richest operation for every stage it applies:
//!
//! ```
//! use molpipe::{Item, Molecule, Pipeline, Value};
//! use molpipe::stages::{MorganFeaturizer, OrganicFilter, Standardizer};
//!
//! let pipeline = Pipeline::new(vec![
//!     Box::new(Standardizer::default()),
//!     Box::new(OrganicFilter::new()),
//!     Box::new(MorganFeaturizer::default()),
//! ]);
//!
//! let mol = Molecule::from_smiles("CC(=O)[O-].[Na+]").unwrap();
//! let output = pipeline.apply(Item::single(mol)).unwrap();
//! match output.as_single() {
//!     Some(Value::Vector(fp)) => assert_eq!(fp.len(), 2048),
//!     other => panic!("unexpected output {:?}", other),
//! }
//! ```

pub mod chem;
pub mod cli;
pub mod core;
pub mod io;
pub mod stages;

// Re-export commonly used types
pub use chem::{Atom, Bond, BondOrder, Molecule, SmilesError};
pub use core::{
    Capabilities, FeatureMatrix, FeatureVector, Filter, Frame, Item, NoopObserver, Operation, OperationKind, Pipeline,
    PipelineConfig, PipelineError, ProgressEvent, ProgressObserver, Run, RunReport, Series, Stage, StageError,
    StageOptions, Transform, TransformFilter, Value,
};
