//! Pipeline dispatcher
//!
//! A pipeline is an ordered list of stages. Applying it to an item runs the
//! stages in order, resolving one operation per stage by capability.

use crate::core::item::{Failure, Item, Series, Value};
use crate::core::observer::{NoopObserver, ProgressEvent, ProgressObserver};
use crate::core::report::{RunReport, StageReport};
use crate::core::stage::{Operation, Stage, StageError};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default name for pipelines built without one
pub const DEFAULT_PIPELINE_NAME: &str = "pipeline";

/// Error types for pipeline dispatch
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Stage '{stage}' supports none of transform_filter, filter or transform")]
    Capability { stage: String },

    #[error("Stage '{stage}' failed on {}: {source}", .member.as_deref().map(|m| format!("member '{}'", m)).unwrap_or_else(|| "item".to_string()))]
    Stage {
        stage: String,
        member: Option<String>,
        #[source]
        source: StageError,
    },
}

/// Output of a pipeline run along with its report
#[derive(Debug, Clone)]
pub struct Run {
    pub output: Item,
    pub report: RunReport,
}

/// What happened to one value at one stage
enum Outcome {
    Kept(Value),
    Dropped,
    Failed(Value),
    Skipped(Value),
}

/// An ordered, immutable sequence of stages
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create a pipeline from stages, applied in the given order
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            name: DEFAULT_PIPELINE_NAME.to_string(),
            stages,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Apply every stage to an item and return the final output
    pub fn apply(&self, item: Item) -> Result<Item, PipelineError> {
        self.run(item, &NoopObserver).map(|run| run.output)
    }

    /// Apply every stage to an item, reporting progress to `observer`
    pub fn run(&self, item: Item, observer: &dyn ProgressObserver) -> Result<Run, PipelineError> {
        let mut report = RunReport::new(&self.name);
        report.start();
        info!("Running pipeline '{}' with {} stages over {} members", self.name, self.stages.len(), item.len());

        let mut current = item;
        for (index, stage) in self.stages.iter().enumerate() {
            if let Item::Rejected { stage: by } = &current {
                debug!("Item rejected by '{}', skipping '{}'", by, stage.name());
                break;
            }

            let operation = match Operation::resolve(stage.as_ref()) {
                Some(op) => op,
                None => {
                    let err = PipelineError::Capability {
                        stage: stage.name().to_string(),
                    };
                    report.fail(err.to_string());
                    return Err(err);
                }
            };

            match self.apply_stage(index, stage.as_ref(), &operation, current, observer) {
                Ok((next, stage_report)) => {
                    report.stages.push(stage_report);
                    current = next;
                }
                Err(err) => {
                    report.fail(err.to_string());
                    return Err(err);
                }
            }
        }

        report.complete();
        info!(
            "Pipeline '{}' completed: {} members out, {} dropped, {} failed",
            self.name,
            current.len(),
            report.total_dropped(),
            report.total_failed()
        );
        Ok(Run {
            output: current,
            report,
        })
    }

    fn apply_stage(
        &self,
        index: usize,
        stage: &dyn Stage,
        operation: &Operation<'_>,
        item: Item,
        observer: &dyn ProgressObserver,
    ) -> Result<(Item, StageReport), PipelineError> {
        let name = stage.name().to_string();
        let mut stage_report = StageReport::new(&name, operation.kind(), item.len());
        info!("Stage {} '{}' using {} on {} members", index + 1, name, operation.kind(), item.len());
        observer.on_event(&ProgressEvent::StageStarted {
            index,
            stage: name.clone(),
            operation: operation.kind(),
            total: item.len(),
        });

        let next = match item {
            Item::Single { value } => {
                let outcome = self.apply_value(stage, operation, None, value)?;
                observer.on_event(&ProgressEvent::ItemProcessed {
                    index,
                    stage: name.clone(),
                    member: "0".to_string(),
                });
                match tally(&mut stage_report, outcome) {
                    Some(value) => Item::Single { value },
                    None => Item::Rejected { stage: name.clone() },
                }
            }
            Item::Collection { members } => {
                let mut survivors = Series::new();
                for member in members {
                    let outcome = self.apply_value(stage, operation, Some(&member.name), member.value)?;
                    observer.on_event(&ProgressEvent::ItemProcessed {
                        index,
                        stage: name.clone(),
                        member: member.name.clone(),
                    });
                    if let Some(value) = tally(&mut stage_report, outcome) {
                        survivors.push(member.name, value);
                    }
                }
                Item::Collection { members: survivors }
            }
            Item::Rejected { .. } => item,
        };

        observer.on_event(&ProgressEvent::StageFinished {
            index,
            stage: name,
            kept: stage_report.kept,
            dropped: stage_report.dropped,
            failed: stage_report.failed,
        });
        Ok((next, stage_report))
    }

    fn apply_value(
        &self,
        stage: &dyn Stage,
        operation: &Operation<'_>,
        member: Option<&str>,
        value: Value,
    ) -> Result<Outcome, PipelineError> {
        if value.is_failed() {
            return Ok(Outcome::Skipped(value));
        }

        let keep_failed = stage.options().keep_failed;
        let input = if keep_failed {
            value.as_mol().map(|mol| mol.to_smiles())
        } else {
            None
        };

        match operation.invoke(value) {
            Ok(Some(value)) => Ok(Outcome::Kept(value)),
            Ok(None) if keep_failed => {
                debug!("'{}' rejected {}, keeping it as failed", stage.name(), member.unwrap_or("item"));
                Ok(Outcome::Failed(Value::Failed(Failure {
                    stage: stage.name().to_string(),
                    reason: "rejected by filter".to_string(),
                    input,
                })))
            }
            Ok(None) => {
                debug!("'{}' dropped {}", stage.name(), member.unwrap_or("item"));
                Ok(Outcome::Dropped)
            }
            Err(source) if keep_failed => {
                warn!("'{}' failed on {}: {}", stage.name(), member.unwrap_or("item"), source);
                Ok(Outcome::Failed(Value::Failed(Failure {
                    stage: stage.name().to_string(),
                    reason: source.to_string(),
                    input,
                })))
            }
            Err(source) => Err(PipelineError::Stage {
                stage: stage.name().to_string(),
                member: member.map(str::to_string),
                source,
            }),
        }
    }
}

/// Count an outcome and return the value to pass on, if any
fn tally(report: &mut StageReport, outcome: Outcome) -> Option<Value> {
    match outcome {
        Outcome::Kept(value) => {
            report.kept += 1;
            Some(value)
        }
        Outcome::Dropped => {
            report.dropped += 1;
            None
        }
        Outcome::Failed(value) => {
            report.failed += 1;
            Some(value)
        }
        Outcome::Skipped(value) => {
            report.skipped += 1;
            Some(value)
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}
