//! Built-in stages
//!
//! Standardization, force-field optimization, filtering and featurization.

pub mod atom;
pub mod distance;
pub mod filters;
pub mod forcefield;
pub mod morgan;
pub mod standardizer;

pub use atom::{AtomFeature, AtomFeaturizer, AtomFeaturizerConfig};
pub use distance::{DistanceConfig, DistanceKind, DistanceTransformer};
pub use filters::{
    AtomNumberFilter, AtomNumberFilterConfig, ElementFilter, ElementFilterConfig, ElementMatch, MassFilter,
    MassFilterConfig, OrganicFilter, Predicate,
};
pub use forcefield::{ForceField, ForceFieldConfig, ForceFieldKind};
pub use morgan::{MorganConfig, MorganFeaturizer};
pub use standardizer::{Standardizer, StandardizerConfig};

use crate::core::stage::{Capabilities, Stage};

/// Description of a stage type available in pipeline configs
#[derive(Debug, Clone, serde::Serialize)]
pub struct StageInfo {
    /// Value of the `type` key
    pub type_name: &'static str,
    pub description: &'static str,
    pub capabilities: Capabilities,
}

/// Every built-in stage type
pub fn catalog() -> Vec<StageInfo> {
    let entry = |type_name, description, stage: &dyn Stage| StageInfo {
        type_name,
        description,
        capabilities: stage.capabilities(),
    };
    vec![
        entry(
            "standardizer",
            "Strip salts and solvents, keep the largest fragment, neutralize",
            &Standardizer::default(),
        ),
        entry(
            "forcefield",
            "Add hydrogens and optimize a 3-D conformer (uff or mmff)",
            &ForceField::default(),
        ),
        entry(
            "element_filter",
            "Keep molecules by the elements they contain",
            &ElementFilter::new(ElementFilterConfig {
                elements: Vec::new(),
                mode: ElementMatch::Any,
            }),
        ),
        entry("organic_filter", "Keep molecules made only of organic elements", &OrganicFilter::new()),
        entry(
            "mass_filter",
            "Keep molecules within a molecular weight range",
            &MassFilter::new(MassFilterConfig::default()),
        ),
        entry(
            "atom_number_filter",
            "Keep molecules within an atom count range",
            &AtomNumberFilter::new(AtomNumberFilterConfig::default()),
        ),
        entry(
            "morgan_featurizer",
            "Circular fingerprint folded to a fixed length",
            &MorganFeaturizer::default(),
        ),
        entry("atom_featurizer", "Per-atom feature matrix", &AtomFeaturizer::default()),
        entry(
            "graph_distance",
            "Topological distance matrix",
            &DistanceTransformer::graph(DistanceConfig::default()),
        ),
        entry(
            "spatial_distance",
            "3-D distance matrix from the conformer",
            &DistanceTransformer::spatial(DistanceConfig::default()),
        ),
    ]
}
