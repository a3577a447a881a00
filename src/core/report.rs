//! Run report models

use crate::core::stage::OperationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Stages are being applied
    Running,
    /// Every stage was applied
    Completed,
    /// A stage raised an error and the run was aborted
    Failed,
}

/// Counts for a single stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage name
    pub stage: String,

    /// Operation the dispatcher picked
    pub operation: OperationKind,

    /// Members received
    pub input: usize,

    /// Members passed on with a value
    pub kept: usize,

    /// Members removed by filtering
    pub dropped: usize,

    /// Members newly marked as failed
    pub failed: usize,

    /// Failure markers passed through untouched
    pub skipped: usize,
}

impl StageReport {
    pub fn new(stage: impl Into<String>, operation: OperationKind, input: usize) -> Self {
        Self {
            stage: stage.into(),
            operation,
            input,
            kept: 0,
            dropped: 0,
            failed: 0,
            skipped: 0,
        }
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Pipeline name
    pub pipeline: String,

    pub status: RunStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Stages applied so far, in order
    pub stages: Vec<StageReport>,

    /// Error message when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline: pipeline.into(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            stages: Vec::new(),
            error: None,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark the run as completed
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Wall-clock duration, once the run has finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Total members newly marked as failed across all stages
    pub fn total_failed(&self) -> usize {
        self.stages.iter().map(|s| s.failed).sum()
    }

    /// Total members dropped across all stages
    pub fn total_dropped(&self) -> usize {
        self.stages.iter().map(|s| s.dropped).sum()
    }
}
