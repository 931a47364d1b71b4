// Timelines - every timeline of one document
//
// Timelines are kept in ordinal order; ordinals are always 1..=len with no
// gaps. This is also the entry point for document snapshots and for
// queries that need the primary beat timeline.

use std::collections::BTreeMap;

use crate::error::{LoadReport, TimelineError, TimelineResult};
use crate::messaging::TimelineEvent;
use crate::services::Services;
use crate::settings::TimelineSettings;
use crate::timeline::beat::{BeatTimeline, MeasureNumber, MetricPosition};
use crate::timeline::{
    AnyTimeline, HarmonyTimeline, HierarchyTimeline, MarkerTimeline, PdfTimeline, ScoreTimeline,
    SliderTimeline, TimelineCore, TimelineId, TimelineKind, TimelineOptions, TimelineState,
};

/// Document state: timeline id -> timeline state
pub type DocumentState = BTreeMap<TimelineId, TimelineState>;

#[derive(Debug)]
pub struct Timelines {
    services: Services,
    settings: TimelineSettings,
    /// Sorted by ordinal
    timelines: Vec<AnyTimeline>,
}

impl Timelines {
    pub fn new(services: Services) -> Self {
        Self::with_settings(services, TimelineSettings::default())
    }

    pub fn with_settings(services: Services, settings: TimelineSettings) -> Self {
        Self {
            services,
            settings,
            timelines: Vec::new(),
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Timelines in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = &AnyTimeline> {
        self.timelines.iter()
    }

    pub fn ids(&self) -> Vec<TimelineId> {
        self.timelines.iter().map(AnyTimeline::id).collect()
    }

    fn build_timeline(
        &self,
        kind: TimelineKind,
        id: TimelineId,
        options: &TimelineOptions,
    ) -> TimelineResult<AnyTimeline> {
        let name = options.name.clone().unwrap_or_default();
        let height = options
            .height
            .unwrap_or_else(|| self.settings.default_height(kind));
        let mut core = TimelineCore::new(id, kind, name, height, self.services.clone());
        if let Some(is_visible) = options.is_visible {
            core.is_visible = is_visible;
        }

        let timeline = match kind {
            TimelineKind::Marker => AnyTimeline::Marker(MarkerTimeline::new(core)),
            TimelineKind::Hierarchy => AnyTimeline::Hierarchy(HierarchyTimeline::new(core)),
            TimelineKind::Beat => {
                let pattern = options
                    .beat_pattern
                    .clone()
                    .unwrap_or_else(|| self.settings.default_beat_pattern.clone());
                AnyTimeline::Beat(
                    BeatTimeline::new(core, pattern)?
                        .with_display_period(self.settings.measure_number_display_period),
                )
            }
            TimelineKind::Harmony => AnyTimeline::Harmony(
                HarmonyTimeline::new(core).with_level_count(
                    options
                        .level_count
                        .unwrap_or(self.settings.default_harmony_levels),
                ),
            ),
            TimelineKind::Pdf => AnyTimeline::Pdf(PdfTimeline::new(
                core,
                options.path.clone().unwrap_or_default(),
                options.page_total.unwrap_or(0),
            )),
            TimelineKind::Score => AnyTimeline::Score(ScoreTimeline::new(core)),
            TimelineKind::Slider => AnyTimeline::Slider(SliderTimeline::new(core)),
        };
        Ok(timeline)
    }

    fn check_singleton(&self, kind: TimelineKind) -> TimelineResult<()> {
        if kind.is_singleton() && self.timelines.iter().any(|t| t.kind() == kind) {
            return Err(TimelineError::SingletonExists(kind));
        }
        Ok(())
    }

    /// Create a timeline at the end of the ordinal sequence
    pub fn create_timeline(
        &mut self,
        kind: TimelineKind,
        options: TimelineOptions,
    ) -> TimelineResult<TimelineId> {
        self.check_singleton(kind)?;
        let id = self.services.next_id();
        let mut timeline = self.build_timeline(kind, id, &options)?;
        timeline.as_timeline_mut().core_mut().ordinal = self.timelines.len() + 1;
        self.timelines.push(timeline);

        self.services
            .notify(TimelineEvent::TimelineCreated { kind, timeline: id });
        log::debug!("Created {} timeline {}", kind, id);
        Ok(id)
    }

    fn position(&self, id: TimelineId) -> TimelineResult<usize> {
        self.timelines
            .iter()
            .position(|t| t.id() == id)
            .ok_or(TimelineError::TimelineNotFound(id))
    }

    /// Delete a timeline with its components; later ordinals shift down
    pub fn delete_timeline(&mut self, id: TimelineId) -> TimelineResult<()> {
        let position = self.position(id)?;
        let mut timeline = self.timelines.remove(position);
        timeline.as_timeline_mut().clear();
        let kind = timeline.kind();
        self.services
            .notify(TimelineEvent::TimelineDeleted { kind, timeline: id });
        log::debug!("Deleted {} timeline {}", kind, id);
        self.compact_ordinals();
        Ok(())
    }

    /// Move a timeline to `ordinal`, shifting the ones in between
    pub fn move_timeline(&mut self, id: TimelineId, ordinal: usize) -> TimelineResult<()> {
        if ordinal == 0 || ordinal > self.timelines.len() {
            return Err(TimelineError::InvalidArgument(format!(
                "ordinal {} is outside 1..={}",
                ordinal,
                self.timelines.len()
            )));
        }
        let position = self.position(id)?;
        let timeline = self.timelines.remove(position);
        self.timelines.insert(ordinal - 1, timeline);
        self.compact_ordinals();
        Ok(())
    }

    fn compact_ordinals(&mut self) {
        for (index, timeline) in self.timelines.iter_mut().enumerate() {
            let timeline = timeline.as_timeline_mut();
            if timeline.ordinal() != index + 1 {
                timeline.core_mut().ordinal = index + 1;
                timeline.notify_changed("ordinal");
            }
        }
    }

    pub fn get(&self, id: TimelineId) -> TimelineResult<&AnyTimeline> {
        self.timelines
            .iter()
            .find(|t| t.id() == id)
            .ok_or(TimelineError::TimelineNotFound(id))
    }

    pub fn get_mut(&mut self, id: TimelineId) -> TimelineResult<&mut AnyTimeline> {
        self.timelines
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or(TimelineError::TimelineNotFound(id))
    }

    pub fn by_kind(&self, kind: TimelineKind) -> Vec<&AnyTimeline> {
        self.timelines.iter().filter(|t| t.kind() == kind).collect()
    }

    pub fn by_name(&self, name: &str) -> Vec<&AnyTimeline> {
        self.timelines
            .iter()
            .filter(|t| t.as_timeline().name() == name)
            .collect()
    }

    pub fn beat(&self, id: TimelineId) -> TimelineResult<&BeatTimeline> {
        let timeline = self.get(id)?;
        timeline.as_beat().ok_or(TimelineError::KindMismatch {
            expected: TimelineKind::Beat,
            found: timeline.kind(),
        })
    }

    pub fn beat_mut(&mut self, id: TimelineId) -> TimelineResult<&mut BeatTimeline> {
        let timeline = self.get_mut(id)?;
        let found = timeline.kind();
        timeline.as_beat_mut().ok_or(TimelineError::KindMismatch {
            expected: TimelineKind::Beat,
            found,
        })
    }

    /// Beat timeline with the lowest ordinal
    pub fn primary_beat_timeline(&self) -> Option<&BeatTimeline> {
        self.timelines.iter().find_map(AnyTimeline::as_beat)
    }

    fn require_primary_beat_timeline(&self) -> TimelineResult<&BeatTimeline> {
        self.primary_beat_timeline()
            .ok_or(TimelineError::NoBeatTimeline)
    }

    /// Metric position of `time` on the primary beat timeline
    pub fn get_metric_position(&self, time: f64) -> TimelineResult<Option<MetricPosition>> {
        self.require_primary_beat_timeline()?
            .metric_position_at(time)
    }

    /// Times of measure `number` plus `fraction` on the primary beat timeline
    pub fn get_time_by_measure(
        &self,
        number: MeasureNumber,
        fraction: f64,
    ) -> TimelineResult<Vec<f64>> {
        self.require_primary_beat_timeline()?
            .get_time_by_measure(number, fraction)
    }

    pub fn get_state(&self) -> TimelineResult<DocumentState> {
        self.timelines
            .iter()
            .map(|t| Ok((t.id(), t.as_timeline().get_state()?)))
            .collect()
    }

    /// Whole-document snapshot, safe to hand to another thread
    pub fn snapshot(&self) -> TimelineResult<serde_json::Value> {
        Ok(serde_json::to_value(self.get_state()?)?)
    }

    /// Replace the whole document with `state`
    ///
    /// Timeline ids come from the state keys; component ids are fresh. A
    /// timeline that cannot be rebuilt is reported and skipped, the rest
    /// still load.
    pub fn restore_state(&mut self, state: &DocumentState) -> TimelineResult<LoadReport> {
        self.clear();

        let mut entries: Vec<(&TimelineId, &TimelineState)> = state.iter().collect();
        entries.sort_by_key(|(id, s)| (s.ordinal, **id));

        let mut report = LoadReport::new();
        for (id, timeline_state) in entries {
            self.services.reserve_id(*id);
            if let Err(e) = self.check_singleton(timeline_state.kind) {
                report.push_error(format!("Timeline {}: {}", id, e));
                continue;
            }
            let mut timeline =
                match self.build_timeline(timeline_state.kind, *id, &TimelineOptions::default()) {
                    Ok(timeline) => timeline,
                    Err(e) => {
                        report.push_error(format!("Timeline {}: {}", id, e));
                        continue;
                    }
                };
            match timeline.as_timeline_mut().restore_state(timeline_state) {
                Ok(timeline_report) => report.merge(timeline_report),
                Err(e) => {
                    report.push_error(format!("Timeline {}: {}", id, e));
                    continue;
                }
            }
            self.timelines.push(timeline);
            self.services.notify(TimelineEvent::TimelineCreated {
                kind: timeline_state.kind,
                timeline: *id,
            });
        }
        self.compact_ordinals();

        log::info!(
            "Restored {} timelines with {} components",
            self.timelines.len(),
            report.created
        );
        if let Some(summary) = report.summary() {
            log::warn!("{}", summary);
        }
        Ok(report)
    }

    pub fn restore_snapshot(&mut self, snapshot: &serde_json::Value) -> TimelineResult<LoadReport> {
        let state: DocumentState = serde_json::from_value(snapshot.clone())?;
        self.restore_state(&state)
    }

    /// Run a batch of edits, restoring the prior document if it fails
    pub fn transaction<T, F>(&mut self, f: F) -> TimelineResult<T>
    where
        F: FnOnce(&mut Self) -> TimelineResult<T>,
    {
        let snapshot = self.snapshot()?;
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                log::info!("Rolling back document after error: {}", e);
                self.restore_snapshot(&snapshot)?;
                Err(e)
            }
        }
    }

    pub fn scale_all(&mut self, factor: f64) -> TimelineResult<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(TimelineError::InvalidArgument(format!(
                "scale factor must be positive, got {}",
                factor
            )));
        }
        for timeline in &mut self.timelines {
            timeline.as_timeline_mut().scale(factor)?;
        }
        Ok(())
    }

    pub fn crop_all(&mut self, length: f64) -> TimelineResult<()> {
        for timeline in &mut self.timelines {
            timeline.as_timeline_mut().crop(length)?;
        }
        Ok(())
    }

    /// Delete every component but keep the timelines
    pub fn clear_all_components(&mut self) {
        for timeline in &mut self.timelines {
            timeline.as_timeline_mut().clear();
        }
    }

    /// Delete every timeline
    pub fn clear(&mut self) {
        for mut timeline in std::mem::take(&mut self.timelines) {
            timeline.as_timeline_mut().clear();
            self.services.notify(TimelineEvent::TimelineDeleted {
                kind: timeline.kind(),
                timeline: timeline.id(),
            });
        }
    }
}
