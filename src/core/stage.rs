//! Stage interfaces and capability dispatch
//!
//! A stage exposes any subset of three operations. The pipeline resolves
//! one operation per stage with a fixed priority: combined
//! transform-filter, then filter, then transform.

use crate::chem::{Molecule, MoleculeError, SmilesError};
use crate::core::item::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error types for stage operations
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Expected a {expected} input, got a {found}")]
    InvalidInput {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Standardization failed: {0}")]
    Standardization(String),

    #[error("Force field error: {0}")]
    ForceField(String),

    #[error("Featurization failed: {0}")]
    Featurization(String),

    #[error(transparent)]
    Smiles(#[from] SmilesError),

    #[error(transparent)]
    Molecule(#[from] MoleculeError),
}

impl StageError {
    /// Build an `InvalidInput` error for a value that is not a molecule
    pub fn expected_molecule(found: &Value) -> Self {
        StageError::InvalidInput {
            expected: "molecule",
            found: found.kind(),
        }
    }
}

/// Per-stage configuration shared by every stage type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOptions {
    /// Retain items whose processing fails, marked as failures, instead of aborting
    #[serde(default)]
    pub keep_failed: bool,
}

impl StageOptions {
    pub fn keep_failed() -> Self {
        Self { keep_failed: true }
    }
}

/// Map an item to a new value
pub trait Transform {
    fn transform(&self, value: Value) -> Result<Value, StageError>;
}

/// Judge whether an item is kept
pub trait Filter {
    fn filter(&self, value: &Value) -> Result<bool, StageError>;
}

/// Drop or transform an item in a single, non-decomposable call
///
/// `Ok(None)` drops the item.
pub trait TransformFilter {
    fn transform_filter(&self, value: Value) -> Result<Option<Value>, StageError>;
}

/// A unit of work in a pipeline
///
/// Implementors return `Some(self)` from the accessors of the operations
/// they support.
pub trait Stage: Send + Sync {
    /// Stage name, used in logs, reports and errors
    fn name(&self) -> &str;

    fn options(&self) -> StageOptions {
        StageOptions::default()
    }

    fn as_transform_filter(&self) -> Option<&dyn TransformFilter> {
        None
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        None
    }

    fn as_transform(&self) -> Option<&dyn Transform> {
        None
    }

    /// Operations this stage supports
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            transform_filter: self.as_transform_filter().is_some(),
            filter: self.as_filter().is_some(),
            transform: self.as_transform().is_some(),
        }
    }
}

/// Set of operations a stage supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub transform_filter: bool,
    pub filter: bool,
    pub transform: bool,
}

impl Capabilities {
    /// The operation the dispatcher will pick, if any
    pub fn preferred(&self) -> Option<OperationKind> {
        if self.transform_filter {
            Some(OperationKind::TransformFilter)
        } else if self.filter {
            Some(OperationKind::Filter)
        } else if self.transform {
            Some(OperationKind::Transform)
        } else {
            None
        }
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.transform_filter {
            names.push("transform_filter");
        }
        if self.filter {
            names.push("filter");
        }
        if self.transform {
            names.push("transform");
        }
        write!(f, "{}", names.join(", "))
    }
}

/// Operation kinds, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    TransformFilter,
    Filter,
    Transform,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::TransformFilter => "transform_filter",
            OperationKind::Filter => "filter",
            OperationKind::Transform => "transform",
        };
        write!(f, "{}", name)
    }
}

/// The operation resolved for one stage
pub enum Operation<'a> {
    TransformFilter(&'a dyn TransformFilter),
    Filter(&'a dyn Filter),
    Transform(&'a dyn Transform),
}

impl<'a> Operation<'a> {
    /// Pick the highest-priority operation a stage supports
    pub fn resolve(stage: &'a dyn Stage) -> Option<Self> {
        if let Some(op) = stage.as_transform_filter() {
            Some(Operation::TransformFilter(op))
        } else if let Some(op) = stage.as_filter() {
            Some(Operation::Filter(op))
        } else {
            stage.as_transform().map(Operation::Transform)
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::TransformFilter(_) => OperationKind::TransformFilter,
            Operation::Filter(_) => OperationKind::Filter,
            Operation::Transform(_) => OperationKind::Transform,
        }
    }

    /// Invoke the operation once; `Ok(None)` means the value was dropped
    pub fn invoke(&self, value: Value) -> Result<Option<Value>, StageError> {
        match self {
            Operation::TransformFilter(op) => op.transform_filter(value),
            Operation::Filter(op) => {
                if op.filter(&value)? {
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }
            Operation::Transform(op) => op.transform(value).map(Some),
        }
    }
}

/// Borrow the molecule out of a value or fail with `InvalidInput`
pub fn expect_molecule(value: &Value) -> Result<&Molecule, StageError> {
    value.as_mol().ok_or_else(|| StageError::expected_molecule(value))
}

/// Take the molecule out of a value or fail with `InvalidInput`
pub fn into_molecule(value: Value) -> Result<Molecule, StageError> {
    match value {
        Value::Mol(mol) => Ok(mol),
        other => Err(StageError::expected_molecule(&other)),
    }
}
