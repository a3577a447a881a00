//! Molecule standardization
//!
//! Strips counter-ions and solvents, keeps the largest remaining fragment
//! and neutralizes charges where a hydrogen can be added or removed.

use crate::chem::Molecule;
use crate::core::item::Value;
use crate::core::stage::{into_molecule, Stage, StageError, StageOptions, TransformFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Formulas of fragments treated as solvents or counter-ions
const SALT_FORMULAS: &[&str] = &[
    "H2O", "HCl", "HBr", "HI", "HF", "H3N", "H4N", "HNO3", "H2O4S", "H3O4P", "CH4O", "C2H6O",
];

fn default_true() -> bool {
    true
}

/// Standardizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizerConfig {
    /// Remove salt and solvent fragments
    #[serde(default = "default_true")]
    pub remove_salts: bool,

    /// Keep only the largest fragment
    #[serde(default = "default_true")]
    pub keep_largest_fragment: bool,

    /// Neutralize charged atoms
    #[serde(default = "default_true")]
    pub neutralize: bool,
}

impl Default for StandardizerConfig {
    fn default() -> Self {
        Self {
            remove_salts: true,
            keep_largest_fragment: true,
            neutralize: true,
        }
    }
}

/// Combined transform-filter that standardizes molecules
///
/// Salt and solvent fragments are only removed when another fragment
/// remains. A molecule that cannot be standardized is dropped, or with `keep_failed`
/// reported as an error so the pipeline can mark it.
pub struct Standardizer {
    name: String,
    options: StageOptions,
    config: StandardizerConfig,
}

impl Standardizer {
    pub fn new(config: StandardizerConfig) -> Self {
        Self {
            name: "standardizer".to_string(),
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

    /// Standardize one molecule
    pub fn standardize(&self, mol: &Molecule) -> Result<Molecule, StageError> {
        if mol.is_empty() {
            return Err(StageError::Standardization("molecule has no atoms".to_string()));
        }

        let mut fragments: Vec<Molecule> = mol.fragments().iter().map(|atoms| mol.extract(atoms)).collect();

        if self.config.remove_salts {
            // A molecule made only of salt or solvent fragments is kept whole
            let (salts, parents): (Vec<Molecule>, Vec<Molecule>) = fragments.into_iter().partition(is_salt);
            fragments = if parents.is_empty() {
                debug!("Only salt or solvent fragments in '{}', keeping them", mol.to_smiles());
                salts
            } else {
                parents
            };
        }

        let mut result = if self.config.keep_largest_fragment {
            largest_fragment(fragments)
        } else {
            merge(fragments)
        };

        if self.config.neutralize {
            neutralize(&mut result);
        }

        let mut result = result.remove_hydrogens();
        result.name = mol.name.clone();
        result
            .sanitize()
            .map_err(|e| StageError::Standardization(e.to_string()))?;
        Ok(result)
    }
}

impl Default for Standardizer {
    fn default() -> Self {
        Self::new(StandardizerConfig::default())
    }
}

impl Stage for Standardizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> StageOptions {
        self.options
    }

    fn as_transform_filter(&self) -> Option<&dyn TransformFilter> {
        Some(self)
    }
}

impl TransformFilter for Standardizer {
    fn transform_filter(&self, value: Value) -> Result<Option<Value>, StageError> {
        let mol = into_molecule(value)?;
        match self.standardize(&mol) {
            Ok(standardized) => Ok(Some(Value::Mol(standardized))),
            Err(err) if self.options.keep_failed => Err(err),
            Err(err) => {
                debug!("Dropping '{}': {}", mol.to_smiles(), err);
                Ok(None)
            }
        }
    }
}

/// Whether a fragment is a known solvent, a bare metal or a halide ion
fn is_salt(fragment: &Molecule) -> bool {
    if fragment.atoms().iter().all(|a| a.element.is_metal()) {
        return true;
    }
    if fragment.num_atoms() == 1 && matches!(fragment.atom(0).symbol(), "F" | "Cl" | "Br" | "I") {
        return true;
    }
    let formula = fragment.formula();
    SALT_FORMULAS.contains(&formula.as_str())
}

/// Largest fragment by heavy atoms, then by weight; first wins ties
fn largest_fragment(fragments: Vec<Molecule>) -> Molecule {
    let mut best: Option<Molecule> = None;
    for fragment in fragments {
        let better = match &best {
            None => true,
            Some(current) => {
                let (a, b) = (fragment.num_heavy_atoms(), current.num_heavy_atoms());
                a > b || (a == b && fragment.molecular_weight() > current.molecular_weight())
            }
        };
        if better {
            best = Some(fragment);
        }
    }
    best.unwrap_or_default()
}

fn merge(fragments: Vec<Molecule>) -> Molecule {
    let mut merged = Molecule::new();
    for fragment in fragments {
        let offset = merged.num_atoms();
        for atom in fragment.atoms() {
            merged.add_atom(atom.clone());
        }
        for bond in fragment.bonds() {
            // indices come from a valid fragment
            let _ = merged.add_bond(bond.begin + offset, bond.end + offset, bond.order);
        }
    }
    merged
}

/// Move charges to zero by adding or removing hydrogens
///
/// Charges balanced by an adjacent opposite charge (nitro, N-oxides) are left alone.
fn neutralize(mol: &mut Molecule) {
    for idx in 0..mol.num_atoms() {
        let charge = mol.atom(idx).charge;
        if charge == 0 {
            continue;
        }
        let balanced = mol
            .neighbors(idx)
            .any(|(n, _)| mol.atom(n).charge.signum() == -charge.signum());
        if balanced {
            continue;
        }

        let atom = mol.atom_mut(idx);
        if charge < 0 {
            atom.h_count += (-charge) as u8;
            atom.charge = 0;
        } else {
            let removable = (charge as u8).min(atom.h_count);
            atom.h_count -= removable;
            atom.charge -= removable as i8;
        }
    }
}
