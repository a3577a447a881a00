//! Pipeline configuration from YAML

use crate::chem::element;
use crate::core::pipeline::{Pipeline, DEFAULT_PIPELINE_NAME};
use crate::core::stage::{Stage, StageOptions};
use crate::io::ReadOptions;
use crate::stages::{
    AtomFeaturizer, AtomFeaturizerConfig, AtomNumberFilter, AtomNumberFilterConfig, DistanceConfig,
    DistanceTransformer, ElementFilter, ElementFilterConfig, ForceField, ForceFieldConfig, MassFilter,
    MassFilterConfig, MorganConfig, MorganFeaturizer, OrganicFilter, Standardizer, StandardizerConfig,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_name() -> String {
    DEFAULT_PIPELINE_NAME.to_string()
}

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    #[serde(default = "default_name")]
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Default input collection, used when none is given on the command line
    #[serde(default)]
    pub input: Option<InputConfig>,

    /// Stages, applied in order
    pub stages: Vec<StageConfig>,
}

/// Where to read the input collection from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Local path or http(s) URL
    pub location: String,

    #[serde(flatten)]
    pub read: ReadOptions,
}

/// One stage as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage name (defaults to the type's name)
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub options: StageOptions,

    #[serde(flatten)]
    pub kind: StageKind,
}

/// Stage type and its settings, selected by the `type` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageKind {
    Standardizer(StandardizerConfig),
    Forcefield(ForceFieldConfig),
    ElementFilter(ElementFilterConfig),
    OrganicFilter {},
    MassFilter(MassFilterConfig),
    AtomNumberFilter(AtomNumberFilterConfig),
    MorganFeaturizer(MorganConfig),
    AtomFeaturizer(AtomFeaturizerConfig),
    GraphDistance(DistanceConfig),
    SpatialDistance(DistanceConfig),
}

impl StageKind {
    /// Value of the `type` key
    pub fn type_name(&self) -> &'static str {
        match self {
            StageKind::Standardizer(_) => "standardizer",
            StageKind::Forcefield(_) => "forcefield",
            StageKind::ElementFilter(_) => "element_filter",
            StageKind::OrganicFilter {} => "organic_filter",
            StageKind::MassFilter(_) => "mass_filter",
            StageKind::AtomNumberFilter(_) => "atom_number_filter",
            StageKind::MorganFeaturizer(_) => "morgan_featurizer",
            StageKind::AtomFeaturizer(_) => "atom_featurizer",
            StageKind::GraphDistance(_) => "graph_distance",
            StageKind::SpatialDistance(_) => "spatial_distance",
        }
    }
}

/// Apply options and an optional name override to a freshly built stage
macro_rules! configured {
    ($stage:expr, $options:expr, $name:expr) => {{
        let stage = $stage.with_options($options);
        match $name {
            Some(name) => Box::new(stage.with_name(name.clone())) as Box<dyn Stage>,
            None => Box::new(stage),
        }
    }};
}

impl StageConfig {
    /// Name the built stage will carry
    pub fn stage_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.build().name().to_string(),
        }
    }

    /// Construct the stage this entry describes
    pub fn build(&self) -> Box<dyn Stage> {
        let options = self.options;
        match &self.kind {
            StageKind::Standardizer(c) => configured!(Standardizer::new(c.clone()), options, &self.name),
            StageKind::Forcefield(c) => configured!(ForceField::new(c.clone()), options, &self.name),
            StageKind::ElementFilter(c) => configured!(ElementFilter::new(c.clone()), options, &self.name),
            StageKind::OrganicFilter {} => configured!(OrganicFilter::new(), options, &self.name),
            StageKind::MassFilter(c) => configured!(MassFilter::new(c.clone()), options, &self.name),
            StageKind::AtomNumberFilter(c) => configured!(AtomNumberFilter::new(c.clone()), options, &self.name),
            StageKind::MorganFeaturizer(c) => configured!(MorganFeaturizer::new(c.clone()), options, &self.name),
            StageKind::AtomFeaturizer(c) => configured!(AtomFeaturizer::new(c.clone()), options, &self.name),
            StageKind::GraphDistance(c) => configured!(DistanceTransformer::graph(c.clone()), options, &self.name),
            StageKind::SpatialDistance(c) => {
                configured!(DistanceTransformer::spatial(c.clone()), options, &self.name)
            }
        }
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            anyhow::bail!("Pipeline '{}' has no stages", self.name);
        }

        let mut seen_names = HashSet::new();
        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.stage_name();
            if !seen_names.insert(name.clone()) {
                anyhow::bail!("Duplicate stage name: {}", name);
            }

            match &stage.kind {
                StageKind::ElementFilter(c) => {
                    if c.elements.is_empty() {
                        anyhow::bail!("Stage '{}' lists no elements", name);
                    }
                    if let Some(unknown) = c.elements.iter().find(|e| element::by_symbol(e).is_none()) {
                        anyhow::bail!("Stage '{}' references unknown element '{}'", name, unknown);
                    }
                }
                StageKind::MassFilter(c) if c.above > c.below => {
                    anyhow::bail!(
                        "Stage '{}' has an empty mass range: above {} > below {}",
                        name,
                        c.above,
                        c.below
                    );
                }
                StageKind::AtomNumberFilter(c) if c.above > c.below => {
                    anyhow::bail!(
                        "Stage '{}' has an empty atom count range: above {} > below {}",
                        name,
                        c.above,
                        c.below
                    );
                }
                StageKind::MorganFeaturizer(c) if c.n_feats == 0 => {
                    anyhow::bail!("Stage '{}' needs n_feats greater than zero", name);
                }
                StageKind::Forcefield(c) if c.max_iterations == 0 => {
                    anyhow::bail!("Stage '{}' needs max_iterations greater than zero", name);
                }
                StageKind::AtomFeaturizer(AtomFeaturizerConfig {
                    max_atoms: Some(0), ..
                })
                | StageKind::GraphDistance(DistanceConfig { max_atoms: Some(0) })
                | StageKind::SpatialDistance(DistanceConfig { max_atoms: Some(0) }) => {
                    anyhow::bail!("Stage {} ('{}') needs max_atoms greater than zero", index + 1, name);
                }
                _ => {}
            }
        }

        if let Some(input) = &self.input {
            if input.location.trim().is_empty() {
                anyhow::bail!("Input location is empty");
            }
            if Some(input.read.smiles_column) == input.read.name_column {
                anyhow::bail!("Input SMILES and name columns are both {}", input.read.smiles_column);
            }
        }

        Ok(())
    }

    /// Convert config to a Pipeline
    pub fn to_pipeline(&self) -> Pipeline {
        let stages = self.stages.iter().map(StageConfig::build).collect();
        Pipeline::new(stages).with_name(&self.name)
    }
}
