//! Items routed through a pipeline, and the values they carry

use crate::chem::Molecule;
use serde::Serialize;
use thiserror::Error;

/// A named 1-D numeric vector (e.g. a fingerprint)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    /// Feature set name (usually the producing stage)
    pub name: String,

    /// Optional per-position labels; positions are labelled by index otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            labels: None,
            values,
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Label of a position
    pub fn label(&self, idx: usize) -> String {
        self.labels
            .as_ref()
            .and_then(|l| l.get(idx).cloned())
            .unwrap_or_else(|| idx.to_string())
    }

    /// Count of non-zero positions
    pub fn count_nonzero(&self) -> usize {
        self.values.iter().filter(|v| **v != 0.0).count()
    }
}

/// A named 2-D numeric matrix in row-major order (e.g. per-atom features)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    pub name: String,
    pub rows: usize,
    pub cols: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_labels: Option<Vec<String>>,

    pub data: Vec<f64>,
}

impl FeatureMatrix {
    /// Create a matrix filled with NaN
    pub fn nan(name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            name: name.into(),
            rows,
            cols,
            column_labels: None,
            data: vec![f64::NAN; rows * cols],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}

/// Marker left in place of a value whose stage failed under keep-failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Stage that raised the error
    pub stage: String,

    /// Error message
    pub reason: String,

    /// SMILES of the input when it was a molecule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// Payload flowing between stages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[serde(rename = "molecule")]
    Mol(Molecule),
    Vector(FeatureVector),
    Matrix(FeatureMatrix),
    Failed(Failure),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Mol(_) => "molecule",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
            Value::Failed(_) => "failure",
        }
    }

    pub fn as_mol(&self) -> Option<&Molecule> {
        match self {
            Value::Mol(mol) => Some(mol),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&FeatureVector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&FeatureMatrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Value::Failed(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Value::Failed(_))
    }
}

impl From<Molecule> for Value {
    fn from(mol: Molecule) -> Self {
        Value::Mol(mol)
    }
}

/// One named member of a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub name: String,
    pub value: Value,
}

/// An order-preserving named collection of values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    members: Vec<Member>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series indexed 0..n
    pub fn from_values<I: IntoIterator<Item = Value>>(values: I) -> Self {
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| (i.to_string(), value))
            .collect()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.members.push(Member {
            name: name.into(),
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    /// First member with the given name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.iter().find(|m| m.name == name).map(|m| &m.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    /// Number of members carrying a failure marker
    pub fn failed_count(&self) -> usize {
        self.members.iter().filter(|m| m.value.is_failed()).count()
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Series {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut series = Series::new();
        for (name, value) in iter {
            series.push(name, value);
        }
        series
    }
}

impl IntoIterator for Series {
    type Item = Member;
    type IntoIter = std::vec::IntoIter<Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

/// Input and output of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A single entity
    Single { value: Value },
    /// A named collection of entities
    Collection { members: Series },
    /// A single entity dropped by a filtering stage
    Rejected { stage: String },
}

impl Item {
    pub fn single(value: impl Into<Value>) -> Self {
        Item::Single { value: value.into() }
    }

    pub fn collection(members: Series) -> Self {
        Item::Collection { members }
    }

    /// Number of entities carried
    pub fn len(&self) -> usize {
        match self {
            Item::Single { .. } => 1,
            Item::Collection { members } => members.len(),
            Item::Rejected { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Item::Rejected { .. })
    }

    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Item::Single { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Series> {
        match self {
            Item::Collection { members } => Some(members),
            _ => None,
        }
    }

    /// Tabulate a collection of vectors: rows by member name, columns by feature
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            Item::Collection { members } => Frame::from_series(members),
            Item::Single { value } => Frame::from_series(&Series::from_values([value.clone()])),
            Item::Rejected { .. } => Err(FrameError::Rejected),
        }
    }
}

/// Errors raised while tabulating results
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("Member '{name}' holds a {kind}, expected a vector")]
    NotAVector { name: String, kind: &'static str },

    #[error("Member '{name}' has {found} features, expected {expected}")]
    Ragged { name: String, expected: usize, found: usize },

    #[error("Item was rejected, nothing to tabulate")]
    Rejected,
}

/// A 2-D table keyed by item name (rows) and feature (columns)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub data: Vec<Vec<f64>>,

    /// Rows produced from failure markers (filled with NaN)
    pub failed: Vec<bool>,
}

impl Frame {
    /// Build a frame from a series whose members are vectors or failures
    pub fn from_series(series: &Series) -> Result<Frame, FrameError> {
        let template = series.iter().find_map(|m| m.value.as_vector());
        let columns: Vec<String> = match template {
            Some(v) => (0..v.len()).map(|i| v.label(i)).collect(),
            None => Vec::new(),
        };
        let width = columns.len();

        let mut frame = Frame {
            index: Vec::with_capacity(series.len()),
            columns,
            data: Vec::with_capacity(series.len()),
            failed: Vec::with_capacity(series.len()),
        };

        for member in series.iter() {
            let (row, failed) = match &member.value {
                Value::Vector(v) if v.len() == width => (v.values.clone(), false),
                Value::Vector(v) => {
                    return Err(FrameError::Ragged {
                        name: member.name.clone(),
                        expected: width,
                        found: v.len(),
                    })
                }
                Value::Failed(_) => (vec![f64::NAN; width], true),
                other => {
                    return Err(FrameError::NotAVector {
                        name: member.name.clone(),
                        kind: other.kind(),
                    })
                }
            };
            frame.index.push(member.name.clone());
            frame.data.push(row);
            frame.failed.push(failed);
        }
        Ok(frame)
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    /// Row for a member name
    pub fn row(&self, name: &str) -> Option<&[f64]> {
        self.index
            .iter()
            .position(|n| n == name)
            .map(|i| self.data[i].as_slice())
    }
}
