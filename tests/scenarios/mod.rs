//! Scenario-based tests for molpipe

mod config_pipeline;
mod dispatch_priority;
mod filtering;
mod keep_failed;
mod notebook;
mod progress;
