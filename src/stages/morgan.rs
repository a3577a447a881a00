//! Morgan (ECFP-style) circular fingerprints

use crate::chem::{BondOrder, Chirality, Molecule};
use crate::core::item::{FeatureVector, Value};
use crate::core::stage::{expect_molecule, Stage, StageError, StageOptions, Transform};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_radius() -> u32 {
    2
}

fn default_n_feats() -> usize {
    2048
}

fn default_true() -> bool {
    true
}

/// Morgan fingerprint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorganConfig {
    /// Number of neighbourhood expansions
    #[serde(default = "default_radius")]
    pub radius: u32,

    /// Fingerprint length
    #[serde(default = "default_n_feats")]
    pub n_feats: usize,

    /// Emit 0/1 bits instead of environment counts
    #[serde(default = "default_true")]
    pub as_bits: bool,

    /// Include chirality tags in atom invariants
    #[serde(default)]
    pub use_chirality: bool,
}

impl Default for MorganConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            n_feats: default_n_feats(),
            as_bits: true,
            use_chirality: false,
        }
    }
}

/// Transform from a molecule to its folded circular fingerprint
pub struct MorganFeaturizer {
    name: String,
    options: StageOptions,
    config: MorganConfig,
}

impl MorganFeaturizer {
    pub fn new(config: MorganConfig) -> Self {
        Self {
            name: "morgan".to_string(),
            options: StageOptions::default(),
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

    /// Unfolded environment identifiers, in discovery order
    pub fn identifiers(&self, mol: &Molecule) -> Vec<u32> {
        let heavy: Vec<usize> = (0..mol.num_atoms()).filter(|&i| !mol.atom(i).is_hydrogen()).collect();
        let ring = mol.ring_info();

        let mut invariants: Vec<u32> = vec![0; mol.num_atoms()];
        for &idx in &heavy {
            invariants[idx] = self.atom_invariant(mol, idx, ring.atom_in_ring[idx]);
        }

        let mut found: Vec<u32> = heavy.iter().map(|&i| invariants[i]).collect();
        let mut environments: Vec<Vec<bool>> = vec![vec![false; mol.num_bonds()]; mol.num_atoms()];
        let mut seen: HashSet<Vec<bool>> = HashSet::new();

        for layer in 1..=self.config.radius {
            let mut next_invariants = invariants.clone();
            let mut next_environments = environments.clone();
            let mut layer_ids: Vec<(Vec<bool>, u32)> = Vec::new();

            for &idx in &heavy {
                let mut neighbours: Vec<(u32, u32)> = Vec::new();
                let env = &mut next_environments[idx];
                for (other, bond) in mol.neighbors(idx) {
                    if mol.atom(other).is_hydrogen() {
                        continue;
                    }
                    neighbours.push((bond_code(bond.order), invariants[other]));
                    if let Some(b) = mol.bond_between(idx, other) {
                        env[b] = true;
                    }
                    for (b, in_env) in environments[other].iter().enumerate() {
                        if *in_env {
                            env[b] = true;
                        }
                    }
                }
                neighbours.sort_unstable();

                let mut id = hash_combine(layer, invariants[idx]);
                for (order, invariant) in neighbours {
                    id = hash_combine(id, order);
                    id = hash_combine(id, invariant);
                }
                next_invariants[idx] = id;
                layer_ids.push((env.clone(), id));
            }

            // an environment already covered by a smaller radius adds nothing
            for (env, id) in layer_ids {
                if env.iter().any(|b| *b) && seen.insert(env) {
                    found.push(id);
                }
            }
            invariants = next_invariants;
            environments = next_environments;
        }
        found
    }

    /// Folded fingerprint of a molecule
    pub fn fingerprint(&self, mol: &Molecule) -> Result<FeatureVector, StageError> {
        if self.config.n_feats == 0 {
            return Err(StageError::Featurization("fingerprint length must be positive".to_string()));
        }
        let mut values = vec![0.0; self.config.n_feats];
        for id in self.identifiers(mol) {
            let bit = id as usize % self.config.n_feats;
            if self.config.as_bits {
                values[bit] = 1.0;
            } else {
                values[bit] += 1.0;
            }
        }
        Ok(FeatureVector::new(self.name.clone(), values))
    }

    fn atom_invariant(&self, mol: &Molecule, idx: usize, in_ring: bool) -> u32 {
        let atom = mol.atom(idx);
        let mut invariant = hash_combine(0, atom.atomic_number() as u32);
        invariant = hash_combine(invariant, mol.heavy_degree(idx) as u32);
        invariant = hash_combine(invariant, mol.total_hydrogens(idx) as u32);
        invariant = hash_combine(invariant, (atom.charge as i32 + 128) as u32);
        invariant = hash_combine(invariant, in_ring as u32);
        if self.config.use_chirality && atom.chirality != Chirality::None {
            invariant = hash_combine(invariant, atom.chirality as u32);
        }
        invariant
    }
}

impl Default for MorganFeaturizer {
    fn default() -> Self {
        Self::new(MorganConfig::default())
    }
}

impl Stage for MorganFeaturizer {
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

impl Transform for MorganFeaturizer {
    fn transform(&self, value: Value) -> Result<Value, StageError> {
        let mol = expect_molecule(&value)?;
        self.fingerprint(mol).map(Value::Vector)
    }
}

fn bond_code(order: BondOrder) -> u32 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 12,
    }
}

fn hash_combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint(smiles: &str, config: MorganConfig) -> FeatureVector {
        let mol = Molecule::from_smiles(smiles).unwrap();
        MorganFeaturizer::new(config).fingerprint(&mol).unwrap()
    }

    #[test]
    fn test_default_length_and_bits() {
        let fp = fingerprint("CC(=O)O", MorganConfig::default());
        assert_eq!(fp.len(), 2048);
        assert!(fp.values.iter().all(|v| *v == 0.0 || *v == 1.0));
        assert!(fp.count_nonzero() > 0);
        assert_eq!(fp.label(2047), "2047");
    }

    #[test]
    fn test_explicit_hydrogens_do_not_change_fingerprint() {
        let mol = Molecule::from_smiles("CC(=O)O").unwrap();
        let stage = MorganFeaturizer::default();
        let implicit = stage.fingerprint(&mol).unwrap();
        let explicit = stage.fingerprint(&mol.add_hydrogens()).unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn test_radius_zero_has_one_identifier_per_heavy_atom() {
        let mol = Molecule::from_smiles("CCO").unwrap();
        let stage = MorganFeaturizer::new(MorganConfig {
            radius: 0,
            ..MorganConfig::default()
        });
        assert_eq!(stage.identifiers(&mol).len(), 3);
    }

    #[test]
    fn test_symmetric_environments_are_not_duplicated() {
        // both carbons of ethane describe the same single-bond environment at radius 1
        let mol = Molecule::from_smiles("CC").unwrap();
        let stage = MorganFeaturizer::new(MorganConfig {
            radius: 1,
            ..MorganConfig::default()
        });
        assert_eq!(stage.identifiers(&mol).len(), 3);
    }

    #[test]
    fn test_count_mode() {
        let fp = fingerprint(
            "CCCCCC",
            MorganConfig {
                as_bits: false,
                ..MorganConfig::default()
            },
        );
        assert!(fp.values.iter().any(|v| *v > 1.0));
    }

    #[test]
    fn test_different_molecules_differ() {
        let a = fingerprint("CCO", MorganConfig::default());
        let b = fingerprint("CCN", MorganConfig::default());
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_length_is_an_error() {
        let mol = Molecule::from_smiles("C").unwrap();
        let stage = MorganFeaturizer::new(MorganConfig {
            n_feats: 0,
            ..MorganConfig::default()
        });
        assert!(matches!(stage.fingerprint(&mol), Err(StageError::Featurization(_))));
    }
}
