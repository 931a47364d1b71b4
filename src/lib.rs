// Timeline annotations - Library exports for tests and benchmarks

pub mod component;
pub mod error;
pub mod import;
pub mod messaging;
pub mod services;
pub mod settings;
pub mod timeline;

// Re-export commonly used types for convenience
pub use component::manager::{SerializedComponents, ValidationPolicy};
pub use component::{
    Beat, Component, ComponentData, ComponentId, ComponentKind, ComponentManager, Extent, Field,
    FieldValue, Harmony, Hierarchy, Marker, Mode, Note, PdfMarker,
};
pub use error::{
    ComponentError, ComponentResult, LoadReport, SettingsError, TimelineError, TimelineResult,
};
pub use import::{HierarchyRow, ImportReport, MeasureRow, TimeRow};
pub use messaging::{ChannelEventSink, EventConsumer, TimelineEvent};
pub use services::{EventSink, IdProvider, MediaClock, MediaDuration, NullEventSink, Services};
pub use settings::TimelineSettings;
pub use timeline::beat::{MeasureNumber, derive_measure_boundaries};
pub use timeline::collection::DocumentState;
pub use timeline::{
    AnyTimeline, BeatTimeline, FillMode, HarmonyTimeline, HierarchyTimeline, MarkerTimeline,
    MetricPosition, PdfTimeline, ScoreTimeline, SliderTimeline, Timeline, TimelineCore, TimelineId,
    TimelineKind, TimelineOptions, TimelineState, Timelines,
};
