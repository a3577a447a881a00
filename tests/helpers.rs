//! Test utility functions for molpipe
#![allow(dead_code)]

use molpipe::core::{
    Capabilities, FeatureVector, Filter, Item, ProgressEvent, ProgressObserver, Series, Stage, StageError,
    StageOptions, Transform, TransformFilter, Value,
};
use std::sync::{Arc, Mutex};

/// Shared log of the operations invoked on recording stages, as `stage:operation`
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A one-element vector standing in for a scalar value
pub fn scalar(x: f64) -> Value {
    Value::Vector(FeatureVector::new("x", vec![x]))
}

/// Read a value created with [`scalar`]
pub fn read_scalar(value: &Value) -> f64 {
    match value {
        Value::Vector(v) => v.values[0],
        other => panic!("Expected a scalar vector, got a {}", other.kind()),
    }
}

/// A collection of scalars named `m0`, `m1`, ...
pub fn scalars(values: &[f64]) -> Item {
    let series: Series = values
        .iter()
        .enumerate()
        .map(|(i, x)| (format!("m{}", i), scalar(*x)))
        .collect();
    Item::collection(series)
}

/// Member names and scalar values of a collection output
pub fn collected(item: &Item) -> Vec<(String, f64)> {
    item.as_collection()
        .unwrap_or_else(|| panic!("Expected a collection, got {:?}", item))
        .iter()
        .map(|m| (m.name.clone(), read_scalar(&m.value)))
        .collect()
}

/// Stage over scalars with configurable capabilities
///
/// - transform multiplies by `factor`
/// - filter keeps values below `limit`
/// - transform_filter does both in one call
///
/// Any operation fails on a value equal to `fail_on`.
pub struct RecordingStage {
    name: String,
    capabilities: Capabilities,
    options: StageOptions,
    factor: f64,
    limit: f64,
    fail_on: Option<f64>,
    log: CallLog,
}

impl RecordingStage {
    pub fn new(name: &str, capabilities: Capabilities, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            capabilities,
            options: StageOptions::default(),
            factor: 2.0,
            limit: f64::INFINITY,
            fail_on: None,
            log: Arc::clone(log),
        }
    }

    pub fn transformer(name: &str, log: &CallLog) -> Self {
        Self::new(name, caps(false, false, true), log)
    }

    pub fn filter(name: &str, log: &CallLog) -> Self {
        Self::new(name, caps(false, true, false), log)
    }

    pub fn all(name: &str, log: &CallLog) -> Self {
        Self::new(name, caps(true, true, true), log)
    }

    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn below(mut self, limit: f64) -> Self {
        self.limit = limit;
        self
    }

    pub fn failing_on(mut self, x: f64) -> Self {
        self.fail_on = Some(x);
        self
    }

    pub fn keep_failed(mut self) -> Self {
        self.options = StageOptions::keep_failed();
        self
    }

    fn record(&self, operation: &str, value: &Value) -> Result<f64, StageError> {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, operation));
        let x = read_scalar(value);
        match self.fail_on {
            Some(bad) if bad == x => Err(StageError::Featurization(format!("cannot handle {}", x))),
            _ => Ok(x),
        }
    }
}

pub fn caps(transform_filter: bool, filter: bool, transform: bool) -> Capabilities {
    Capabilities {
        transform_filter,
        filter,
        transform,
    }
}

impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> StageOptions {
        self.options
    }

    fn as_transform_filter(&self) -> Option<&dyn TransformFilter> {
        self.capabilities.transform_filter.then_some(self as &dyn TransformFilter)
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        self.capabilities.filter.then_some(self as &dyn Filter)
    }

    fn as_transform(&self) -> Option<&dyn Transform> {
        self.capabilities.transform.then_some(self as &dyn Transform)
    }
}

impl Transform for RecordingStage {
    fn transform(&self, value: Value) -> Result<Value, StageError> {
        let x = self.record("transform", &value)?;
        Ok(scalar(x * self.factor))
    }
}

impl Filter for RecordingStage {
    fn filter(&self, value: &Value) -> Result<bool, StageError> {
        let x = self.record("filter", value)?;
        Ok(x < self.limit)
    }
}

impl TransformFilter for RecordingStage {
    fn transform_filter(&self, value: Value) -> Result<Option<Value>, StageError> {
        let x = self.record("transform_filter", &value)?;
        Ok((x < self.limit).then(|| scalar(x * self.factor)))
    }
}

/// Observer that keeps every event it receives
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_stage_capabilities() {
        let log = call_log();
        let stage = RecordingStage::filter("f", &log);
        assert!(stage.as_filter().is_some());
        assert!(stage.as_transform().is_none());
        assert!(stage.as_transform_filter().is_none());
    }

    #[test]
    fn test_scalars_are_named_in_order() {
        let item = scalars(&[1.0, 2.0]);
        assert_eq!(collected(&item), vec![("m0".to_string(), 1.0), ("m1".to_string(), 2.0)]);
    }
}
