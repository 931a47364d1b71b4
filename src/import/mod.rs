// Import - create components from parsed rows
//
// File parsing (CSV, MusicXML) happens elsewhere; rows arrive here as plain
// data. Rows addressed by measure resolve through the primary beat timeline.
// A failing row is recorded and the next row is tried.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentData, ComponentId, Hierarchy, Marker};
use crate::error::{TimelineError, TimelineResult};
use crate::timeline::beat::MeasureNumber;
use crate::timeline::{TimelineId, TimelineKind, Timelines};

/// Point annotation addressed by measure number and offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureRow {
    pub measure: MeasureNumber,
    #[serde(default)]
    pub fraction: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub comment: String,
}

/// Segment addressed by start and end measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRow {
    pub start_measure: MeasureNumber,
    #[serde(default)]
    pub start_fraction: f64,
    pub end_measure: MeasureNumber,
    #[serde(default)]
    pub end_fraction: f64,
    pub level: u32,
    #[serde(default)]
    pub label: String,
}

/// Point annotation addressed by time in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRow {
    pub time: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub comment: String,
}

/// Outcome of one import batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub created: Vec<ComponentId>,
    /// (row index, reason)
    pub errors: Vec<(usize, String)>,
}

impl ImportReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn row_error(&mut self, row: usize, reason: impl ToString) {
        let reason = reason.to_string();
        log::debug!("Import row {}: {}", row, reason);
        self.errors.push((row, reason));
    }

    pub fn summary(&self) -> String {
        format!(
            "{} components imported, {} rows failed",
            self.created.len(),
            self.errors.len()
        )
    }

    /// Turn any row failure into an error, for imports that must be complete
    ///
    /// Combined with `Timelines::transaction` this rolls the document back.
    pub fn ensure_ok(self) -> TimelineResult<Self> {
        let Some((row, reason)) = self.errors.first() else {
            return Ok(self);
        };
        Err(TimelineError::ImportFailed(format!(
            "{} (first failure at row {}: {})",
            self.summary(),
            row,
            reason
        )))
    }
}

fn check_target(
    timelines: &Timelines,
    target: TimelineId,
    expected: TimelineKind,
) -> TimelineResult<()> {
    let found = timelines.get(target)?.kind();
    if found != expected {
        return Err(TimelineError::KindMismatch { expected, found });
    }
    Ok(())
}

/// Times for one measure reference, or the row's failure reason
fn resolve_measure(
    timelines: &Timelines,
    measure: MeasureNumber,
    fraction: f64,
) -> Result<Vec<f64>, String> {
    match timelines.get_time_by_measure(measure, fraction) {
        Ok(times) if times.is_empty() => Err(format!("measure {} not found", measure)),
        Ok(times) => Ok(times),
        Err(e) => Err(e.to_string()),
    }
}

/// One marker per measure carrying the row's number
pub fn import_markers_by_measure(
    timelines: &mut Timelines,
    target: TimelineId,
    rows: &[MeasureRow],
) -> TimelineResult<ImportReport> {
    check_target(timelines, target, TimelineKind::Marker)?;
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let times = match resolve_measure(timelines, row.measure, row.fraction) {
            Ok(times) => times,
            Err(reason) => {
                report.row_error(index, reason);
                continue;
            }
        };
        let timeline = timelines.get_mut(target)?.as_timeline_mut();
        for time in times {
            let marker = Marker {
                time,
                label: row.label.clone(),
                comment: row.comment.clone(),
                color: None,
            };
            match timeline.create_timeline_component(ComponentData::Marker(marker)) {
                Ok(id) => report.created.push(id),
                Err(e) => report.row_error(index, e),
            }
        }
    }
    log::info!("Marker import: {}", report.summary());
    Ok(report)
}

/// One hierarchy per start measure match, ending at the first later end match
pub fn import_hierarchies_by_measure(
    timelines: &mut Timelines,
    target: TimelineId,
    rows: &[HierarchyRow],
) -> TimelineResult<ImportReport> {
    check_target(timelines, target, TimelineKind::Hierarchy)?;
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let starts = match resolve_measure(timelines, row.start_measure, row.start_fraction) {
            Ok(times) => times,
            Err(reason) => {
                report.row_error(index, reason);
                continue;
            }
        };
        let ends = match resolve_measure(timelines, row.end_measure, row.end_fraction) {
            Ok(times) => times,
            Err(reason) => {
                report.row_error(index, reason);
                continue;
            }
        };

        let timeline = timelines.get_mut(target)?.as_timeline_mut();
        for start in starts {
            let Some(end) = ends.iter().copied().find(|end| *end > start) else {
                report.row_error(
                    index,
                    format!("measure {} has no end after {}", row.end_measure, start),
                );
                continue;
            };
            let hierarchy = Hierarchy::with_label(start, end, row.level, row.label.clone());
            match timeline.create_timeline_component(ComponentData::Hierarchy(hierarchy)) {
                Ok(id) => report.created.push(id),
                Err(e) => report.row_error(index, e),
            }
        }
    }
    log::info!("Hierarchy import: {}", report.summary());
    Ok(report)
}

pub fn import_markers_by_time(
    timelines: &mut Timelines,
    target: TimelineId,
    rows: &[TimeRow],
) -> TimelineResult<ImportReport> {
    check_target(timelines, target, TimelineKind::Marker)?;
    let timeline = timelines.get_mut(target)?.as_timeline_mut();
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let marker = Marker {
            time: row.time,
            label: row.label.clone(),
            comment: row.comment.clone(),
            color: None,
        };
        match timeline.create_timeline_component(ComponentData::Marker(marker)) {
            Ok(id) => report.created.push(id),
            Err(e) => report.row_error(index, e),
        }
    }
    log::info!("Marker import: {}", report.summary());
    Ok(report)
}

/// Beats at the given times; duplicates and out-of-range times are reported
pub fn import_beats(
    timelines: &mut Timelines,
    target: TimelineId,
    times: &[f64],
) -> TimelineResult<ImportReport> {
    let timeline = timelines.beat_mut(target)?;
    let mut report = ImportReport::default();

    for (index, time) in times.iter().enumerate() {
        match timeline.create_beat(*time) {
            Ok(id) => report.created.push(id),
            Err(e) => report.row_error(index, e),
        }
    }
    log::info!("Beat import: {}", report.summary());
    Ok(report)
}
