//! Core domain models for molpipe
//!
//! This module defines the values that flow through a pipeline, the stage
//! capability traits, the dispatcher that applies them, and the YAML
//! configuration that builds it.

pub mod config;
pub mod item;
pub mod observer;
pub mod pipeline;
pub mod report;
pub mod stage;

pub use config::{InputConfig, PipelineConfig, StageConfig, StageKind};
pub use item::*;
pub use observer::*;
pub use pipeline::*;
pub use report::*;
pub use stage::*;
