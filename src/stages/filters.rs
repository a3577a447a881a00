//! Molecule filters
//!
//! Each filter judges a molecule with a predicate. Filters also expose a
//! transform that returns the judgment as a one-value vector, so the
//! dispatcher's preference for filtering over transforming is observable.

use crate::chem::{element, Molecule, ORGANIC};
use crate::core::item::{FeatureVector, Value};
use crate::core::stage::{expect_molecule, Filter, Stage, StageError, StageOptions, Transform};
use serde::{Deserialize, Serialize};

/// A yes/no judgment over a molecule
pub trait Predicate {
    fn judge(&self, mol: &Molecule) -> bool;
}

/// Implement `Stage`, `Filter` and `Transform` for a predicate type with
/// `name` and `options` fields
macro_rules! predicate_stage {
    ($ty:ty) => {
        impl $ty {
            pub fn with_options(mut self, options: StageOptions) -> Self {
                self.options = options;
                self
            }

            pub fn with_name(mut self, name: impl Into<String>) -> Self {
                self.name = name.into();
                self
            }
        }

        impl Stage for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn options(&self) -> StageOptions {
                self.options
            }

            fn as_filter(&self) -> Option<&dyn Filter> {
                Some(self)
            }

            fn as_transform(&self) -> Option<&dyn Transform> {
                Some(self)
            }
        }

        impl Filter for $ty {
            fn filter(&self, value: &Value) -> Result<bool, StageError> {
                Ok(self.judge(expect_molecule(value)?))
            }
        }

        impl Transform for $ty {
            fn transform(&self, value: Value) -> Result<Value, StageError> {
                let passed = self.judge(expect_molecule(&value)?);
                let vector = FeatureVector::new(self.name.clone(), vec![if passed { 1.0 } else { 0.0 }])
                    .with_labels(vec![self.name.clone()]);
                Ok(Value::Vector(vector))
            }
        }
    };
}

/// How the element list of an `ElementFilter` is matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementMatch {
    /// Keep molecules containing at least one listed element
    #[default]
    Any,
    /// Keep molecules containing every listed element
    All,
    /// Keep molecules containing none of the listed elements
    None,
    /// Keep molecules made only of listed elements
    Only,
}

/// Element filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementFilterConfig {
    /// Element symbols
    pub elements: Vec<String>,

    #[serde(default, rename = "match")]
    pub mode: ElementMatch,
}

/// Filter on the elements a molecule contains
pub struct ElementFilter {
    name: String,
    options: StageOptions,
    config: ElementFilterConfig,
}

impl ElementFilter {
    pub fn new(config: ElementFilterConfig) -> Self {
        Self {
            name: "element_filter".to_string(),
            options: StageOptions::default(),
            config,
        }
    }

    /// Symbols in the element list that are not in the element table
    pub fn unknown_elements(&self) -> Vec<&str> {
        self.config
            .elements
            .iter()
            .map(String::as_str)
            .filter(|s| element::by_symbol(s).is_none())
            .collect()
    }
}

impl Predicate for ElementFilter {
    fn judge(&self, mol: &Molecule) -> bool {
        let listed = |symbol: &str| self.config.elements.iter().any(|e| e == symbol);
        let contains = |symbol: &str| mol.atoms().iter().any(|a| a.symbol() == symbol);
        match self.config.mode {
            ElementMatch::Any => self.config.elements.iter().any(|e| contains(e)),
            ElementMatch::All => self.config.elements.iter().all(|e| contains(e)),
            ElementMatch::None => !self.config.elements.iter().any(|e| contains(e)),
            ElementMatch::Only => mol.atoms().iter().all(|a| listed(a.symbol())),
        }
    }
}

predicate_stage!(ElementFilter);

/// Keep molecules made only of organic elements
pub struct OrganicFilter {
    name: String,
    options: StageOptions,
}

impl OrganicFilter {
    pub fn new() -> Self {
        Self {
            name: "organic_filter".to_string(),
            options: StageOptions::default(),
        }
    }
}

impl Default for OrganicFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate for OrganicFilter {
    fn judge(&self, mol: &Molecule) -> bool {
        mol.atoms().iter().all(|a| ORGANIC.contains(&a.symbol()))
    }
}

predicate_stage!(OrganicFilter);

fn default_mass_above() -> f64 {
    3.0
}

fn default_mass_below() -> f64 {
    900.0
}

/// Mass filter configuration; bounds are inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassFilterConfig {
    #[serde(default = "default_mass_above")]
    pub above: f64,

    #[serde(default = "default_mass_below")]
    pub below: f64,
}

impl Default for MassFilterConfig {
    fn default() -> Self {
        Self {
            above: default_mass_above(),
            below: default_mass_below(),
        }
    }
}

/// Keep molecules whose molecular weight lies in a range
pub struct MassFilter {
    name: String,
    options: StageOptions,
    config: MassFilterConfig,
}

impl MassFilter {
    pub fn new(config: MassFilterConfig) -> Self {
        Self {
            name: "mass_filter".to_string(),
            options: StageOptions::default(),
            config,
        }
    }
}

impl Predicate for MassFilter {
    fn judge(&self, mol: &Molecule) -> bool {
        let mass = mol.molecular_weight();
        mass >= self.config.above && mass <= self.config.below
    }
}

predicate_stage!(MassFilter);

fn default_atoms_above() -> usize {
    2
}

fn default_atoms_below() -> usize {
    100
}

/// Atom count filter configuration; bounds are inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomNumberFilterConfig {
    #[serde(default = "default_atoms_above")]
    pub above: usize,

    #[serde(default = "default_atoms_below")]
    pub below: usize,

    /// Count hydrogens as atoms
    #[serde(default)]
    pub include_hydrogens: bool,
}

impl Default for AtomNumberFilterConfig {
    fn default() -> Self {
        Self {
            above: default_atoms_above(),
            below: default_atoms_below(),
            include_hydrogens: false,
        }
    }
}

/// Keep molecules whose atom count lies in a range
pub struct AtomNumberFilter {
    name: String,
    options: StageOptions,
    config: AtomNumberFilterConfig,
}

impl AtomNumberFilter {
    pub fn new(config: AtomNumberFilterConfig) -> Self {
        Self {
            name: "atom_number_filter".to_string(),
            options: StageOptions::default(),
            config,
        }
    }
}

impl Predicate for AtomNumberFilter {
    fn judge(&self, mol: &Molecule) -> bool {
        let count = if self.config.include_hydrogens {
            (0..mol.num_atoms())
                .map(|i| 1 + mol.atom(i).h_count as usize)
                .sum()
        } else {
            mol.num_heavy_atoms()
        };
        count >= self.config.above && count <= self.config.below
    }
}

predicate_stage!(AtomNumberFilter);
