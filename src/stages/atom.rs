//! Per-atom feature matrices

use crate::chem::{Hybridization, Molecule, RingInfo, ORGANIC};
use crate::core::item::{FeatureMatrix, Value};
use crate::core::stage::{expect_molecule, Stage, StageError, StageOptions, Transform};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single per-atom feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum AtomFeature {
    AtomicNumber,
    AtomicMass,
    FormalCharge,
    PaulingElectronegativity,
    FirstIonisation,
    Group,
    Period,
    Valence,
    IsAromatic,
    NumHydrogens,
    IsInRing,
    IsHAcceptor,
    IsHDonor,
    IsHeteroatom,
    /// Whether the atom is the given organic element
    IsElement(&'static str),
    IsHybridized(Hybridization),
}

const HYBRIDIZATIONS: &[(Hybridization, &str)] = &[
    (Hybridization::S, "S"),
    (Hybridization::Sp, "SP"),
    (Hybridization::Sp2, "SP2"),
    (Hybridization::Sp3, "SP3"),
    (Hybridization::Other, "OTHER"),
];

impl AtomFeature {
    /// Every feature, in default column order
    pub fn all() -> Vec<AtomFeature> {
        let mut features = vec![
            AtomFeature::AtomicNumber,
            AtomFeature::AtomicMass,
            AtomFeature::FormalCharge,
            AtomFeature::PaulingElectronegativity,
            AtomFeature::FirstIonisation,
            AtomFeature::Group,
            AtomFeature::Period,
            AtomFeature::Valence,
            AtomFeature::IsAromatic,
            AtomFeature::NumHydrogens,
            AtomFeature::IsInRing,
            AtomFeature::IsHAcceptor,
            AtomFeature::IsHDonor,
            AtomFeature::IsHeteroatom,
        ];
        features.extend(ORGANIC.iter().map(|s| AtomFeature::IsElement(*s)));
        features.extend(HYBRIDIZATIONS.iter().map(|(h, _)| AtomFeature::IsHybridized(*h)));
        features
    }

    /// Feature value for one atom
    fn compute(&self, mol: &Molecule, idx: usize, ring: &RingInfo) -> f64 {
        let atom = mol.atom(idx);
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            AtomFeature::AtomicNumber => atom.atomic_number() as f64,
            AtomFeature::AtomicMass => atom.mass(),
            AtomFeature::FormalCharge => atom.charge as f64,
            AtomFeature::PaulingElectronegativity => atom.element.electronegativity.unwrap_or(f64::NAN),
            AtomFeature::FirstIonisation => atom.element.first_ionisation.unwrap_or(f64::NAN),
            AtomFeature::Group => atom.element.group as f64,
            AtomFeature::Period => atom.element.period as f64,
            AtomFeature::Valence => mol.valence(idx) as f64,
            AtomFeature::IsAromatic => flag(atom.aromatic),
            AtomFeature::NumHydrogens => mol.total_hydrogens(idx) as f64,
            AtomFeature::IsInRing => flag(ring.atom_in_ring[idx]),
            AtomFeature::IsHAcceptor => flag(matches!(atom.symbol(), "N" | "O") && atom.charge <= 0),
            AtomFeature::IsHDonor => flag(matches!(atom.symbol(), "N" | "O") && mol.total_hydrogens(idx) > 0),
            AtomFeature::IsHeteroatom => flag(!matches!(atom.atomic_number(), 1 | 6)),
            AtomFeature::IsElement(symbol) => flag(atom.symbol() == *symbol),
            AtomFeature::IsHybridized(h) => flag(mol.hybridization(idx) == *h),
        }
    }
}

impl fmt::Display for AtomFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomFeature::AtomicNumber => write!(f, "atomic_number"),
            AtomFeature::AtomicMass => write!(f, "atomic_mass"),
            AtomFeature::FormalCharge => write!(f, "formal_charge"),
            AtomFeature::PaulingElectronegativity => write!(f, "pauling_electronegativity"),
            AtomFeature::FirstIonisation => write!(f, "first_ionisation"),
            AtomFeature::Group => write!(f, "group"),
            AtomFeature::Period => write!(f, "period"),
            AtomFeature::Valence => write!(f, "valence"),
            AtomFeature::IsAromatic => write!(f, "is_aromatic"),
            AtomFeature::NumHydrogens => write!(f, "num_hydrogens"),
            AtomFeature::IsInRing => write!(f, "is_in_ring"),
            AtomFeature::IsHAcceptor => write!(f, "is_h_acceptor"),
            AtomFeature::IsHDonor => write!(f, "is_h_donor"),
            AtomFeature::IsHeteroatom => write!(f, "is_heteroatom"),
            AtomFeature::IsElement(symbol) => write!(f, "is_{}", symbol),
            AtomFeature::IsHybridized(h) => {
                let name = HYBRIDIZATIONS
                    .iter()
                    .find(|(candidate, _)| candidate == h)
                    .map(|(_, name)| *name)
                    .unwrap_or("OTHER");
                write!(f, "is_{}_hybridized", name)
            }
        }
    }
}

impl FromStr for AtomFeature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AtomFeature::all()
            .into_iter()
            .find(|feature| feature.to_string() == s)
            .ok_or_else(|| format!("unknown atom feature '{}'", s))
    }
}

impl<'de> Deserialize<'de> for AtomFeature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(de::Error::custom)
    }
}

impl From<AtomFeature> for String {
    fn from(feature: AtomFeature) -> Self {
        feature.to_string()
    }
}

/// Atom featurizer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AtomFeaturizerConfig {
    /// Features to compute; empty selects all of them
    #[serde(default)]
    pub features: Vec<AtomFeature>,

    /// Pad rows with NaN up to this many atoms
    #[serde(default)]
    pub max_atoms: Option<usize>,
}

/// Transform from a molecule to an atoms x features matrix
pub struct AtomFeaturizer {
    name: String,
    options: StageOptions,
    features: Vec<AtomFeature>,
    max_atoms: Option<usize>,
}

impl AtomFeaturizer {
    pub fn new(config: AtomFeaturizerConfig) -> Self {
        let features = if config.features.is_empty() {
            AtomFeature::all()
        } else {
            config.features
        };
        Self {
            name: "atom_feat".to_string(),
            options: StageOptions::default(),
            features,
            max_atoms: config.max_atoms,
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

    pub fn features(&self) -> &[AtomFeature] {
        &self.features
    }

    pub fn featurize(&self, mol: &Molecule) -> Result<FeatureMatrix, StageError> {
        let rows = padded_size(mol, self.max_atoms)?;
        let ring = mol.ring_info();
        let mut matrix = FeatureMatrix::nan(self.name.clone(), rows, self.features.len());
        matrix.column_labels = Some(self.features.iter().map(|f| f.to_string()).collect());
        for idx in 0..mol.num_atoms() {
            for (col, feature) in self.features.iter().enumerate() {
                matrix.set(idx, col, feature.compute(mol, idx, &ring));
            }
        }
        Ok(matrix)
    }
}

impl Default for AtomFeaturizer {
    fn default() -> Self {
        Self::new(AtomFeaturizerConfig::default())
    }
}

impl Stage for AtomFeaturizer {
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

impl Transform for AtomFeaturizer {
    fn transform(&self, value: Value) -> Result<Value, StageError> {
        let mol = expect_molecule(&value)?;
        self.featurize(mol).map(Value::Matrix)
    }
}

/// Matrix size for a molecule, failing when it exceeds the padding size
pub(crate) fn padded_size(mol: &Molecule, max_atoms: Option<usize>) -> Result<usize, StageError> {
    match max_atoms {
        Some(max) if mol.num_atoms() > max => Err(StageError::Featurization(format!(
            "molecule has {} atoms, more than max_atoms {}",
            mol.num_atoms(),
            max
        ))),
        Some(max) => Ok(max),
        None => Ok(mol.num_atoms()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn featurizer(features: &[&str], max_atoms: Option<usize>) -> AtomFeaturizer {
        AtomFeaturizer::new(AtomFeaturizerConfig {
            features: features.iter().map(|f| f.parse().unwrap()).collect(),
            max_atoms,
        })
    }

    #[test]
    fn test_feature_names_round_trip() {
        for feature in AtomFeature::all() {
            assert_eq!(feature.to_string().parse::<AtomFeature>(), Ok(feature));
        }
        assert_eq!("is_Cl".parse::<AtomFeature>(), Ok(AtomFeature::IsElement("Cl")));
        assert_eq!(
            "is_SP2_hybridized".parse::<AtomFeature>(),
            Ok(AtomFeature::IsHybridized(Hybridization::Sp2))
        );
        assert!("is_Na".parse::<AtomFeature>().is_err());
    }

    #[test]
    fn test_default_uses_all_features() {
        let stage = AtomFeaturizer::default();
        assert_eq!(stage.features().len(), 14 + ORGANIC.len() + 5);
    }

    #[test]
    fn test_featurize_acetic_acid() {
        let mol = Molecule::from_smiles("CC(=O)O").unwrap();
        let matrix = featurizer(&["atomic_number", "num_hydrogens", "is_h_donor", "is_SP2_hybridized"], None)
            .featurize(&mol)
            .unwrap();

        assert_eq!((matrix.rows, matrix.cols), (4, 4));
        assert_eq!(matrix.row(0), &[6.0, 3.0, 0.0, 0.0]);
        assert_eq!(matrix.row(1), &[6.0, 0.0, 0.0, 1.0]);
        assert_eq!(matrix.row(3), &[8.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_padding_with_nan() {
        let mol = Molecule::from_smiles("CO").unwrap();
        let matrix = featurizer(&["is_in_ring"], Some(4)).featurize(&mol).unwrap();
        assert_eq!(matrix.rows, 4);
        assert_eq!(matrix.get(1, 0), 0.0);
        assert!(matrix.get(2, 0).is_nan());
    }

    #[test]
    fn test_too_many_atoms() {
        let mol = Molecule::from_smiles("CCCC").unwrap();
        assert!(matches!(
            featurizer(&["group"], Some(3)).featurize(&mol),
            Err(StageError::Featurization(_))
        ));
    }

    #[test]
    fn test_config_rejects_unknown_feature() {
        let yaml = "features: [atomic_number, wingspan]";
        let err = serde_yaml::from_str::<AtomFeaturizerConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown atom feature 'wingspan'"));
    }

    #[test]
    fn test_config_parses_feature_names() {
        let yaml = "features: [atomic_number, is_Cl, is_SP3_hybridized]\nmax_atoms: 8";
        let config: AtomFeaturizerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.features,
            vec![
                AtomFeature::AtomicNumber,
                AtomFeature::IsElement("Cl"),
                AtomFeature::IsHybridized(Hybridization::Sp3),
            ]
        );
        assert_eq!(config.max_atoms, Some(8));

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("is_Cl"));
    }
}
