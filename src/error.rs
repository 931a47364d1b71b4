// Error types for the timeline core
// Validation errors are recoverable and returned per item, invariant
// violations fail the operation that hit them.

use crate::component::{ComponentId, ComponentKind, Field};
use crate::timeline::{TimelineId, TimelineKind};

/// Result type for component creation and mutation
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Result type for timeline and document operations
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Validation errors raised while creating or mutating a component
///
/// These describe bad user input (or bad imported data) and are expected
/// to be collected and shown per item rather than aborting a batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComponentError {
    #[error("Component kind {component} is not permitted in a {timeline} timeline")]
    KindNotPermitted {
        component: ComponentKind,
        timeline: TimelineKind,
    },

    #[error("Time {0} is negative")]
    NegativeTime(f64),

    #[error("Time {time} exceeds media duration {duration}")]
    TimeExceedsDuration { time: f64, duration: f64 },

    #[error("A {kind} already exists at time {time}")]
    DuplicateTime { kind: ComponentKind, time: f64 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: Field, reason: String },

    #[error("{kind} has no attribute '{field}'")]
    NoSuchAttribute { kind: ComponentKind, field: Field },

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl ComponentError {
    /// Helper for field validators
    pub fn invalid(field: Field, reason: impl Into<String>) -> Self {
        ComponentError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from timeline, metric model and document operations
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Component {0} not found")]
    ComponentNotFound(ComponentId),

    #[error("Timeline {0} not found")]
    TimelineNotFound(TimelineId),

    #[error("Expected a {expected} timeline, found {found}")]
    KindMismatch {
        expected: TimelineKind,
        found: TimelineKind,
    },

    #[error("Only one {0} timeline is allowed per document")]
    SingletonExists(TimelineKind),

    #[error("No beat timeline in document")]
    NoBeatTimeline,

    #[error("Beat timeline is empty")]
    EmptyBeatTimeline,

    #[error("No such beat: index {index} (timeline has {count} beats)")]
    NoSuchBeat { index: usize, count: usize },

    #[error("Measure index {index} out of range (timeline has {count} measures)")]
    MeasureOutOfRange { index: usize, count: usize },

    #[error("Measure {0} is the last measure and has no end boundary")]
    LastMeasure(usize),

    #[error("Fraction {0} must be between 0 and 1")]
    InvalidFraction(f64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors reading or writing the settings file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] ron::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Aggregate outcome of a bulk load
///
/// One failing item never hides another: errors are only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Number of components (or timelines) successfully created
    pub created: usize,
    /// Per-item error descriptions
    pub errors: Vec<String>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: LoadReport) {
        self.created += other.created;
        self.errors.extend(other.errors);
    }

    /// User-facing summary, e.g. "2 components failed to load"
    pub fn summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(format!("{} components failed to load", self.errors.len()))
        }
    }
}
