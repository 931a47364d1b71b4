// Timeline - one lane of annotations over the media
//
// A timeline owns one ComponentManager plus display attributes. Generic
// behavior (component lifecycle, state export/restore, scale and crop) lives
// in provided methods of the Timeline trait; each kind supplies its scalar
// state and reacts to component changes through hooks.

pub mod beat;
pub mod collection;
pub mod harmony;
pub mod hierarchy;
pub mod marker;
pub mod pdf;
pub mod score;
pub mod slider;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::component::manager::SerializedComponents;
use crate::component::{
    Component, ComponentData, ComponentId, ComponentKind, ComponentManager, Field, FieldValue,
};
use crate::error::{ComponentResult, LoadReport, TimelineError, TimelineResult};
use crate::messaging::TimelineEvent;
use crate::services::Services;

pub use beat::{BeatTimeline, FillMode, MetricPosition};
pub use collection::Timelines;
pub use harmony::HarmonyTimeline;
pub use hierarchy::HierarchyTimeline;
pub use marker::MarkerTimeline;
pub use pdf::PdfTimeline;
pub use score::ScoreTimeline;
pub use slider::SliderTimeline;

/// Unique identifier for timelines
pub type TimelineId = u64;

/// Closed set of timeline kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Marker,
    Hierarchy,
    Beat,
    Harmony,
    Pdf,
    Score,
    Slider,
}

impl TimelineKind {
    pub const ALL: [TimelineKind; 7] = [
        TimelineKind::Marker,
        TimelineKind::Hierarchy,
        TimelineKind::Beat,
        TimelineKind::Harmony,
        TimelineKind::Pdf,
        TimelineKind::Score,
        TimelineKind::Slider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineKind::Marker => "marker",
            TimelineKind::Hierarchy => "hierarchy",
            TimelineKind::Beat => "beat",
            TimelineKind::Harmony => "harmony",
            TimelineKind::Pdf => "pdf",
            TimelineKind::Score => "score",
            TimelineKind::Slider => "slider",
        }
    }

    /// Component kinds a timeline of this kind may own
    pub fn component_kinds(&self) -> &'static [ComponentKind] {
        match self {
            TimelineKind::Marker => &[ComponentKind::Marker],
            TimelineKind::Hierarchy => &[ComponentKind::Hierarchy],
            TimelineKind::Beat => &[ComponentKind::Beat],
            TimelineKind::Harmony => &[ComponentKind::Harmony, ComponentKind::Mode],
            TimelineKind::Pdf => &[ComponentKind::PdfMarker],
            TimelineKind::Score => &[ComponentKind::Note],
            TimelineKind::Slider => &[],
        }
    }

    /// At most one timeline of this kind per document
    pub fn is_singleton(&self) -> bool {
        matches!(self, TimelineKind::Slider)
    }
}

impl fmt::Display for TimelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by every timeline kind
#[derive(Debug)]
pub struct TimelineCore {
    pub(crate) id: TimelineId,
    pub(crate) name: String,
    pub(crate) height: u32,
    pub(crate) is_visible: bool,
    /// 1-based position among the document's timelines
    pub(crate) ordinal: usize,
    pub(crate) components: ComponentManager,
    pub(crate) services: Services,
}

impl TimelineCore {
    pub fn new(
        id: TimelineId,
        kind: TimelineKind,
        name: impl Into<String>,
        height: u32,
        services: Services,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            height,
            is_visible: true,
            ordinal: 1,
            components: ComponentManager::new(kind, services.clone()),
            services,
        }
    }

    pub(crate) fn notify(&self, event: TimelineEvent) {
        self.services.notify(event);
    }
}

/// Persisted form of one timeline
///
/// `extra` holds the kind-specific scalars (beat pattern, pdf path, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineState {
    pub kind: TimelineKind,
    #[serde(default)]
    pub name: String,
    pub height: u32,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    pub ordinal: usize,
    #[serde(default)]
    pub extra: Map<String, Value>,
    #[serde(default)]
    pub components: SerializedComponents,
}

fn default_visible() -> bool {
    true
}

/// Common timeline behavior
///
/// Implementors provide access to their core and optionally override the
/// hooks; everything else is provided.
pub trait Timeline {
    fn core(&self) -> &TimelineCore;

    fn core_mut(&mut self) -> &mut TimelineCore;

    /// Kind-specific scalar state for `get_state`
    fn extra_state(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Load kind-specific scalars, called by `restore_state` before components
    fn restore_extra_state(&mut self, _extra: &Map<String, Value>) -> TimelineResult<()> {
        Ok(())
    }

    /// Called after a component was removed from the manager
    fn on_component_deleted(&mut self, _component: &Component) {}

    /// Called once after any change to the component set or its times
    fn on_components_changed(&mut self) {}

    fn kind(&self) -> TimelineKind {
        self.core().components.timeline_kind()
    }

    fn id(&self) -> TimelineId {
        self.core().id
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn height(&self) -> u32 {
        self.core().height
    }

    fn is_visible(&self) -> bool {
        self.core().is_visible
    }

    fn ordinal(&self) -> usize {
        self.core().ordinal
    }

    fn components(&self) -> &ComponentManager {
        &self.core().components
    }

    fn component_count(&self) -> usize {
        self.core().components.len()
    }

    /// Create a component and notify listeners
    fn create_timeline_component(&mut self, data: ComponentData) -> ComponentResult<ComponentId> {
        let id = self.core_mut().components.create_component(data)?;
        let core = self.core();
        core.notify(TimelineEvent::ComponentCreated {
            kind: self.kind(),
            timeline: core.id,
            component: id,
        });
        self.on_components_changed();
        Ok(id)
    }

    fn delete_timeline_component(&mut self, id: ComponentId) -> TimelineResult<()> {
        let component = self.core_mut().components.delete_component(id)?;
        self.on_component_deleted(&component);
        let core = self.core();
        core.notify(TimelineEvent::ComponentDeleted {
            kind: self.kind(),
            timeline: core.id,
            component: id,
        });
        self.on_components_changed();
        Ok(())
    }

    fn set_component_data(
        &mut self,
        id: ComponentId,
        field: Field,
        value: FieldValue,
    ) -> TimelineResult<FieldValue> {
        let value = self
            .core_mut()
            .components
            .set_component_data(id, field, value)?;
        let core = self.core();
        core.notify(TimelineEvent::ComponentChanged {
            kind: self.kind(),
            timeline: core.id,
            component: id,
            field,
        });
        if field.is_time() {
            self.on_components_changed();
        }
        Ok(value)
    }

    fn get_state(&self) -> TimelineResult<TimelineState> {
        let core = self.core();
        Ok(TimelineState {
            kind: self.kind(),
            name: core.name.clone(),
            height: core.height,
            is_visible: core.is_visible,
            ordinal: core.ordinal,
            extra: self.extra_state(),
            components: core.components.serialize_components()?,
        })
    }

    /// Replace this timeline's content with `state`
    ///
    /// Always clears first. Per-component failures are collected in the
    /// returned report; a bad scalar fails the whole restore.
    fn restore_state(&mut self, state: &TimelineState) -> TimelineResult<LoadReport> {
        if state.kind != self.kind() {
            return Err(TimelineError::KindMismatch {
                expected: self.kind(),
                found: state.kind,
            });
        }
        self.clear();

        let core = self.core_mut();
        core.name = state.name.clone();
        core.height = state.height;
        core.is_visible = state.is_visible;
        core.ordinal = state.ordinal;

        self.restore_extra_state(&state.extra)?;

        let (report, _) = self
            .core_mut()
            .components
            .deserialize_components(&state.components);
        let core = self.core();
        for id in core.components.ids() {
            core.notify(TimelineEvent::ComponentCreated {
                kind: self.kind(),
                timeline: core.id,
                component: id,
            });
        }
        self.on_components_changed();
        Ok(report)
    }

    /// Delete every component, returning the removed ids
    fn clear(&mut self) -> Vec<ComponentId> {
        let ids = self.core_mut().components.clear();
        let core = self.core();
        for id in &ids {
            core.notify(TimelineEvent::ComponentDeleted {
                kind: self.kind(),
                timeline: core.id,
                component: *id,
            });
        }
        self.on_components_changed();
        ids
    }

    /// Multiply every component time by `factor`
    fn scale(&mut self, factor: f64) -> TimelineResult<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(TimelineError::InvalidArgument(format!(
                "scale factor must be positive, got {}",
                factor
            )));
        }
        self.core_mut().components.scale(factor);
        self.on_components_changed();
        Ok(())
    }

    /// Delete or truncate components beyond `length` seconds
    fn crop(&mut self, length: f64) -> TimelineResult<Vec<ComponentId>> {
        if !(length.is_finite() && length >= 0.0) {
            return Err(TimelineError::InvalidArgument(format!(
                "crop length must be non-negative, got {}",
                length
            )));
        }
        let deleted = self.core_mut().components.crop(length);
        for component in &deleted {
            self.on_component_deleted(component);
            let core = self.core();
            core.notify(TimelineEvent::ComponentDeleted {
                kind: self.kind(),
                timeline: core.id,
                component: component.id(),
            });
        }
        self.on_components_changed();
        Ok(deleted.iter().map(Component::id).collect())
    }

    fn set_name(&mut self, name: &str) {
        self.core_mut().name = name.to_string();
        self.notify_changed("name");
    }

    fn set_height(&mut self, height: u32) {
        self.core_mut().height = height;
        self.notify_changed("height");
    }

    fn set_visible(&mut self, is_visible: bool) {
        self.core_mut().is_visible = is_visible;
        self.notify_changed("is_visible");
    }

    fn notify_changed(&self, attribute: &'static str) {
        let core = self.core();
        core.notify(TimelineEvent::TimelineChanged {
            kind: self.kind(),
            timeline: core.id,
            attribute,
        });
    }
}

/// Read one optional scalar out of an `extra` map
pub(crate) fn extra_field<T: serde::de::DeserializeOwned>(
    extra: &Map<String, Value>,
    key: &str,
) -> TimelineResult<Option<T>> {
    match extra.get(key) {
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        None => Ok(None),
    }
}

/// Construction parameters for `Timelines::create_timeline`
///
/// Unset values fall back to `TimelineSettings` defaults.
#[derive(Debug, Clone, Default)]
pub struct TimelineOptions {
    pub name: Option<String>,
    pub height: Option<u32>,
    pub is_visible: Option<bool>,
    /// Beat timelines only
    pub beat_pattern: Option<Vec<usize>>,
    /// PDF timelines only
    pub path: Option<String>,
    pub page_total: Option<u32>,
    /// Harmony timelines only
    pub level_count: Option<u32>,
}

impl TimelineOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_beat_pattern(mut self, pattern: Vec<usize>) -> Self {
        self.beat_pattern = Some(pattern);
        self
    }

    pub fn with_pdf(mut self, path: impl Into<String>, page_total: u32) -> Self {
        self.path = Some(path.into());
        self.page_total = Some(page_total);
        self
    }
}

/// Any timeline, dispatched by kind
#[derive(Debug)]
pub enum AnyTimeline {
    Marker(MarkerTimeline),
    Hierarchy(HierarchyTimeline),
    Beat(BeatTimeline),
    Harmony(HarmonyTimeline),
    Pdf(PdfTimeline),
    Score(ScoreTimeline),
    Slider(SliderTimeline),
}

macro_rules! any_timeline {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            AnyTimeline::Marker($inner) => $body,
            AnyTimeline::Hierarchy($inner) => $body,
            AnyTimeline::Beat($inner) => $body,
            AnyTimeline::Harmony($inner) => $body,
            AnyTimeline::Pdf($inner) => $body,
            AnyTimeline::Score($inner) => $body,
            AnyTimeline::Slider($inner) => $body,
        }
    };
}

impl AnyTimeline {
    pub fn as_timeline(&self) -> &dyn Timeline {
        any_timeline!(self, t => t as &dyn Timeline)
    }

    pub fn as_timeline_mut(&mut self) -> &mut dyn Timeline {
        any_timeline!(self, t => t as &mut dyn Timeline)
    }

    pub fn kind(&self) -> TimelineKind {
        self.as_timeline().kind()
    }

    pub fn id(&self) -> TimelineId {
        self.as_timeline().id()
    }

    pub fn as_beat(&self) -> Option<&BeatTimeline> {
        match self {
            AnyTimeline::Beat(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_beat_mut(&mut self) -> Option<&mut BeatTimeline> {
        match self {
            AnyTimeline::Beat(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_hierarchy(&self) -> Option<&HierarchyTimeline> {
        match self {
            AnyTimeline::Hierarchy(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_hierarchy_mut(&mut self) -> Option<&mut HierarchyTimeline> {
        match self {
            AnyTimeline::Hierarchy(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_harmony(&self) -> Option<&HarmonyTimeline> {
        match self {
            AnyTimeline::Harmony(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_pdf_mut(&mut self) -> Option<&mut PdfTimeline> {
        match self {
            AnyTimeline::Pdf(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_score(&self) -> Option<&ScoreTimeline> {
        match self {
            AnyTimeline::Score(t) => Some(t),
            _ => None,
        }
    }
}
