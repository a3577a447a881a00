//! Topological and spatial distance matrices

use crate::chem::Molecule;
use crate::core::item::{FeatureMatrix, Value};
use crate::core::stage::{expect_molecule, Stage, StageError, StageOptions, Transform};
use crate::stages::atom::padded_size;
use serde::{Deserialize, Serialize};

/// Distance transformer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// Pad columns with NaN up to this many atoms
    #[serde(default)]
    pub max_atoms: Option<usize>,
}

/// Which distance to measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceKind {
    /// Shortest path length in bonds
    Graph,
    /// Euclidean distance in the attached conformer
    Spatial,
}

/// Transform from a molecule to an atoms x `max_atoms` distance matrix
///
/// Unreachable atom pairs and padding are NaN.
pub struct DistanceTransformer {
    name: String,
    options: StageOptions,
    kind: DistanceKind,
    config: DistanceConfig,
}

impl DistanceTransformer {
    pub fn graph(config: DistanceConfig) -> Self {
        Self::new(DistanceKind::Graph, config)
    }

    pub fn spatial(config: DistanceConfig) -> Self {
        Self::new(DistanceKind::Spatial, config)
    }

    pub fn new(kind: DistanceKind, config: DistanceConfig) -> Self {
        let name = match kind {
            DistanceKind::Graph => "graph_dist",
            DistanceKind::Spatial => "spatial_dist",
        };
        Self {
            name: name.to_string(),
            options: StageOptions::default(),
            kind,
            config,
        }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn distances(&self, mol: &Molecule) -> Result<FeatureMatrix, StageError> {
        let cols = padded_size(mol, self.config.max_atoms)?;
        let n = mol.num_atoms();
        let mut matrix = FeatureMatrix::nan(self.name.clone(), n, cols);

        match self.kind {
            DistanceKind::Graph => {
                for from in 0..n {
                    for (to, d) in mol.graph_distances(from).into_iter().enumerate() {
                        if let Some(d) = d {
                            matrix.set(from, to, d as f64);
                        }
                    }
                }
            }
            DistanceKind::Spatial => {
                let coords = mol.conformer().ok_or(StageError::InvalidInput {
                    expected: "molecule with a conformer",
                    found: "molecule without a conformer",
                })?;
                for a in 0..n {
                    for b in 0..n {
                        let d: f64 = (0..3).map(|k| (coords[a][k] - coords[b][k]).powi(2)).sum();
                        matrix.set(a, b, d.sqrt());
                    }
                }
            }
        }
        Ok(matrix)
    }
}

impl Stage for DistanceTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> StageOptions {
        self.options
    }

    fn as_transform(&self) -> Option<&dyn Transform> {
        Some(self)
    }
}

impl Transform for DistanceTransformer {
    fn transform(&self, value: Value) -> Result<Value, StageError> {
        let mol = expect_molecule(&value)?;
        self.distances(mol).map(Value::Matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::forcefield::ForceField;

    #[test]
    fn test_graph_distances_of_propanol() {
        let mol = Molecule::from_smiles("CCCO").unwrap();
        let matrix = DistanceTransformer::graph(DistanceConfig::default()).distances(&mol).unwrap();
        assert_eq!((matrix.rows, matrix.cols), (4, 4));
        assert_eq!(matrix.row(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(matrix.get(3, 1), 2.0);
    }

    #[test]
    fn test_graph_distances_pad_and_disconnect_with_nan() {
        let mol = Molecule::from_smiles("C.C").unwrap();
        let matrix = DistanceTransformer::graph(DistanceConfig { max_atoms: Some(3) })
            .distances(&mol)
            .unwrap();
        assert_eq!((matrix.rows, matrix.cols), (2, 3));
        assert_eq!(matrix.get(0, 0), 0.0);
        assert!(matrix.get(0, 1).is_nan());
        assert!(matrix.get(1, 2).is_nan());
    }

    #[test]
    fn test_spatial_requires_conformer() {
        let mol = Molecule::from_smiles("CO").unwrap();
        let stage = DistanceTransformer::spatial(DistanceConfig::default());
        assert!(matches!(stage.distances(&mol), Err(StageError::InvalidInput { .. })));
    }

    #[test]
    fn test_spatial_distances_are_symmetric() {
        let mol = ForceField::default()
            .optimize(&Molecule::from_smiles("CO").unwrap())
            .unwrap();
        let matrix = DistanceTransformer::spatial(DistanceConfig::default())
            .distances(&mol)
            .unwrap();
        let n = mol.num_atoms();
        assert_eq!((matrix.rows, matrix.cols), (n, n));
        for a in 0..n {
            assert_eq!(matrix.get(a, a), 0.0);
            for b in 0..n {
                assert!((matrix.get(a, b) - matrix.get(b, a)).abs() < 1e-12);
            }
        }
        assert!(matrix.get(0, 1) > 1.0);
    }
}
