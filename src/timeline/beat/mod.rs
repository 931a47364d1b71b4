// BeatTimeline - metric model over a sorted beat sequence
//
// Measures are not components: they exist only as per-measure beat counts
// (`beats_in_measure`) with a displayed number each. Every change to the
// beat set is followed by `recalculate_measures`, which restores
// sum(beats_in_measure) == beat count.

pub mod measures;

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::component::{Beat, ComponentData, ComponentId, Field};
use crate::error::{ComponentError, ComponentResult, TimelineError, TimelineResult};
use crate::messaging::TimelineEvent;
use crate::timeline::{Timeline, TimelineCore, extra_field};

pub use measures::{MeasureNumber, derive_measure_boundaries};

/// Default beats per measure when no pattern is given
pub const DEFAULT_BEAT_PATTERN: [usize; 1] = [4];

/// Position of a time in metric terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPosition {
    pub measure_index: usize,
    pub measure_number: MeasureNumber,
    /// 1-based beat within the measure
    pub beat_in_measure: usize,
    /// Offset towards the next beat, in [0, 1)
    pub fraction: f64,
}

/// How `fill_with_beats` spreads beats over the media
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillMode {
    /// This many beats, evenly spaced from 0
    Count(usize),
    /// One beat every `interval` seconds from 0
    Interval(f64),
}

#[derive(Debug)]
pub struct BeatTimeline {
    core: TimelineCore,
    beat_pattern: Vec<usize>,
    beats_in_measure: Vec<usize>,
    measure_numbers: Vec<MeasureNumber>,
    /// Measures whose number is always displayed; also stops renumbering
    measures_to_force_display: BTreeSet<usize>,
    display_period: u32,
}

fn check_pattern(pattern: &[usize]) -> TimelineResult<()> {
    if pattern.is_empty() || pattern.contains(&0) {
        return Err(TimelineError::InvalidArgument(format!(
            "beat pattern must be a non-empty list of positive counts, got {:?}",
            pattern
        )));
    }
    Ok(())
}

impl BeatTimeline {
    pub fn new(core: TimelineCore, beat_pattern: Vec<usize>) -> TimelineResult<Self> {
        check_pattern(&beat_pattern)?;
        Ok(Self {
            core,
            beat_pattern,
            beats_in_measure: Vec::new(),
            measure_numbers: Vec::new(),
            measures_to_force_display: BTreeSet::new(),
            display_period: 1,
        })
    }

    /// Show every n-th measure number (plus the first and forced ones)
    pub fn with_display_period(mut self, period: u32) -> Self {
        self.display_period = period.max(1);
        self
    }

    pub fn beat_pattern(&self) -> &[usize] {
        &self.beat_pattern
    }

    pub fn beats_in_measure(&self) -> &[usize] {
        &self.beats_in_measure
    }

    pub fn measure_numbers(&self) -> &[MeasureNumber] {
        &self.measure_numbers
    }

    pub fn measures_to_force_display(&self) -> Vec<usize> {
        self.measures_to_force_display.iter().copied().collect()
    }

    /// Index of the first beat of each measure
    pub fn beats_that_start_measures(&self) -> Vec<usize> {
        derive_measure_boundaries(&self.beats_in_measure)
    }

    pub fn beat_count(&self) -> usize {
        self.core.components.len()
    }

    pub fn measure_count(&self) -> usize {
        self.beats_in_measure.len()
    }

    /// Beat times in ascending order
    pub fn beat_times(&self) -> Vec<f64> {
        self.core.components.iter().map(|c| c.time()).collect()
    }

    fn beat_time(&self, beat_index: usize) -> Option<f64> {
        self.core.components.get_by_index(beat_index).map(|c| c.time())
    }

    pub fn create_beat(&mut self, time: f64) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::Beat(Beat::new(time)))
    }

    /// Reconcile the measure sequences with the current beat count
    pub fn recalculate_measures(&mut self) {
        let beat_count = self.beat_count();
        let total: usize = self.beats_in_measure.iter().sum();

        if beat_count > total {
            measures::extend_measures(
                &mut self.beats_in_measure,
                &self.beat_pattern,
                beat_count - total,
            );
        } else if beat_count < total {
            measures::trim_measures(&mut self.beats_in_measure, total - beat_count);
        }

        let measure_count = self.measure_count();
        measures::fit_measure_numbers(&mut self.measure_numbers, measure_count);
        self.measures_to_force_display
            .retain(|index| *index < measure_count);

        log::debug!(
            "Beat timeline {}: {} beats in {} measures",
            self.core.id,
            beat_count,
            measure_count
        );
        self.core.notify(TimelineEvent::MeasuresChanged {
            timeline: self.core.id,
        });
    }

    fn check_measure(&self, index: usize) -> TimelineResult<()> {
        if index >= self.measure_count() {
            return Err(TimelineError::MeasureOutOfRange {
                index,
                count: self.measure_count(),
            });
        }
        Ok(())
    }

    /// Time of the first beat of measure `index`
    pub fn measure_start_time(&self, index: usize) -> TimelineResult<f64> {
        self.check_measure(index)?;
        let boundaries = self.beats_that_start_measures();
        boundaries
            .get(index)
            .and_then(|beat| self.beat_time(*beat))
            .ok_or(TimelineError::MeasureOutOfRange {
                index,
                count: self.measure_count(),
            })
    }

    /// Times of every measure displayed as `number`, offset by `fraction`
    ///
    /// The offset spans up to the next measure's start; the last measure has
    /// no length, so fraction has no effect there. An empty list means no
    /// measure carries that number.
    pub fn get_time_by_measure(
        &self,
        number: MeasureNumber,
        fraction: f64,
    ) -> TimelineResult<Vec<f64>> {
        if self.beat_count() == 0 {
            return Err(TimelineError::EmptyBeatTimeline);
        }
        if !(0.0..=1.0).contains(&fraction) {
            return Err(TimelineError::InvalidFraction(fraction));
        }

        let mut times = Vec::new();
        for (index, _) in self
            .measure_numbers
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == number)
        {
            let start = self.measure_start_time(index)?;
            let next = if index + 1 < self.measure_count() {
                self.measure_start_time(index + 1)?
            } else {
                start
            };
            times.push(start + fraction * (next - start));
        }
        Ok(times)
    }

    /// Measure index and 0-based position within it of a flat beat index
    pub fn get_measure_index(&self, beat_index: usize) -> TimelineResult<(usize, usize)> {
        let count = self.beat_count();
        if beat_index >= count {
            return Err(TimelineError::NoSuchBeat {
                index: beat_index,
                count,
            });
        }
        measures::locate_beat(&self.beats_that_start_measures(), beat_index).ok_or(
            TimelineError::NoSuchBeat {
                index: beat_index,
                count,
            },
        )
    }

    pub fn get_beat_index(&self, id: ComponentId) -> Option<usize> {
        self.core.components.index_of(id)
    }

    pub fn is_first_in_measure(&self, id: ComponentId) -> bool {
        self.get_beat_index(id)
            .is_some_and(|index| self.get_measure_index(index).is_ok_and(|(_, within)| within == 0))
    }

    /// Space the beats of a measure evenly up to the next measure's start
    pub fn distribute_beats(&mut self, index: usize) -> TimelineResult<()> {
        self.check_measure(index)?;
        if index + 1 == self.measure_count() {
            return Err(TimelineError::LastMeasure(index));
        }

        let boundaries = self.beats_that_start_measures();
        let (first, next) = (boundaries[index], boundaries[index + 1]);
        let start = self.measure_start_time(index)?;
        let end = self.measure_start_time(index + 1)?;
        let interval = (end - start) / (next - first) as f64;

        let ids = self.core.components.ids();
        for (offset, id) in ids[first..next].iter().enumerate() {
            let time = start + offset as f64 * interval;
            self.core.components.update_in_place(*id, |data| {
                if let ComponentData::Beat(beat) = data {
                    beat.time = time;
                }
            })?;
            self.core.notify(TimelineEvent::ComponentChanged {
                kind: self.kind(),
                timeline: self.core.id,
                component: *id,
                field: Field::Time,
            });
        }
        Ok(())
    }

    /// Set the displayed number of a measure and renumber the following ones
    ///
    /// The measure is pinned: later renumbering from an earlier measure
    /// stops here.
    pub fn set_measure_number(&mut self, index: usize, number: MeasureNumber) -> TimelineResult<()> {
        self.check_measure(index)?;
        self.measure_numbers[index] = number;
        self.measures_to_force_display.insert(index);
        self.propagate_measure_number_change(index);
        Ok(())
    }

    /// Unpin a measure and give it the number following its predecessor
    pub fn reset_measure_number(&mut self, index: usize) -> TimelineResult<()> {
        self.check_measure(index)?;
        self.measures_to_force_display.remove(&index);
        self.measure_numbers[index] = match index {
            0 => 1,
            _ => self.measure_numbers[index - 1] + 1,
        };
        self.propagate_measure_number_change(index);
        Ok(())
    }

    fn propagate_measure_number_change(&mut self, index: usize) {
        measures::propagate_measure_numbers(&mut self.measure_numbers, index, |i| {
            self.measures_to_force_display.contains(&i)
        });
        self.core.notify(TimelineEvent::MeasuresChanged {
            timeline: self.core.id,
        });
    }

    pub fn force_display_measure_number(&mut self, index: usize) -> TimelineResult<()> {
        self.check_measure(index)?;
        self.measures_to_force_display.insert(index);
        Ok(())
    }

    pub fn unforce_display_measure_number(&mut self, index: usize) -> TimelineResult<()> {
        self.check_measure(index)?;
        self.measures_to_force_display.remove(&index);
        Ok(())
    }

    pub fn should_display_measure_number(&self, index: usize) -> bool {
        let Some(number) = self.measure_numbers.get(index) else {
            return false;
        };
        index == 0
            || self.measures_to_force_display.contains(&index)
            || number.rem_euclid(self.display_period as MeasureNumber) == 0
    }

    /// Replace the pattern and rebuild the measures from it
    ///
    /// Assigned measure numbers are kept for measures that still exist.
    pub fn set_beat_pattern(&mut self, pattern: Vec<usize>) -> TimelineResult<()> {
        check_pattern(&pattern)?;
        self.beat_pattern = pattern;
        self.beats_in_measure.clear();
        self.recalculate_measures();
        Ok(())
    }

    /// Change one measure's beat count; the trailing measures absorb the difference
    pub fn change_beats_in_measure(&mut self, index: usize, count: usize) -> TimelineResult<()> {
        self.check_measure(index)?;
        if count == 0 {
            return Err(TimelineError::InvalidArgument(
                "a measure needs at least one beat".to_string(),
            ));
        }
        self.beats_in_measure[index] = count;
        self.recalculate_measures();
        Ok(())
    }

    /// Measure index containing `time` and the offset towards the next measure
    ///
    /// `None` before the first beat. The last measure always yields 0.
    pub fn metric_fraction_at(&self, time: f64) -> TimelineResult<Option<(usize, f64)>> {
        if self.beat_count() == 0 {
            return Err(TimelineError::EmptyBeatTimeline);
        }
        let starts: Vec<f64> = self
            .beats_that_start_measures()
            .iter()
            .filter_map(|beat| self.beat_time(*beat))
            .collect();
        let Some(index) = starts.partition_point(|start| *start <= time).checked_sub(1) else {
            return Ok(None);
        };
        let fraction = match starts.get(index + 1) {
            Some(next) if *next > starts[index] => (time - starts[index]) / (next - starts[index]),
            _ => 0.0,
        };
        Ok(Some((index, fraction)))
    }

    /// Metric position of the beat at or before `time`
    pub fn metric_position_at(&self, time: f64) -> TimelineResult<Option<MetricPosition>> {
        let times = self.beat_times();
        if times.is_empty() {
            return Err(TimelineError::EmptyBeatTimeline);
        }
        let Some(beat_index) = times.partition_point(|t| *t <= time).checked_sub(1) else {
            return Ok(None);
        };
        let (measure_index, within) = self.get_measure_index(beat_index)?;
        let fraction = match times.get(beat_index + 1) {
            Some(next) => (time - times[beat_index]) / (next - times[beat_index]),
            None => 0.0,
        };
        Ok(Some(MetricPosition {
            measure_index,
            measure_number: self.measure_numbers[measure_index],
            beat_in_measure: within + 1,
            fraction,
        }))
    }

    /// Add evenly spaced beats over the media duration, skipping taken times
    ///
    /// Measures are recalculated once at the end. Returns how many beats
    /// were created.
    pub fn fill_with_beats(&mut self, mode: FillMode) -> TimelineResult<usize> {
        let duration = self.core.services.media_duration();
        let times: Vec<f64> = match mode {
            FillMode::Count(0) => {
                return Err(TimelineError::InvalidArgument(
                    "beat count must be positive".to_string(),
                ));
            }
            FillMode::Count(n) => (0..n).map(|k| k as f64 * duration / n as f64).collect(),
            FillMode::Interval(interval) if !(interval.is_finite() && interval > 0.0) => {
                return Err(TimelineError::InvalidArgument(format!(
                    "beat interval must be positive, got {}",
                    interval
                )));
            }
            FillMode::Interval(interval) => {
                let steps = (duration / interval).floor() as usize;
                (0..=steps).map(|k| k as f64 * interval).collect()
            }
        };

        let mut created = 0;
        for time in times {
            match self
                .core
                .components
                .create_component(ComponentData::Beat(Beat::new(time)))
            {
                Ok(id) => {
                    created += 1;
                    self.core.notify(TimelineEvent::ComponentCreated {
                        kind: self.kind(),
                        timeline: self.core.id,
                        component: id,
                    });
                }
                Err(ComponentError::DuplicateTime { .. }) => {}
                Err(e) => log::debug!("Skipping beat at {}: {}", time, e),
            }
        }
        self.recalculate_measures();
        Ok(created)
    }
}

impl Timeline for BeatTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }

    fn extra_state(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("beat_pattern".into(), Value::from(self.beat_pattern.clone()));
        extra.insert(
            "beats_in_measure".into(),
            Value::from(self.beats_in_measure.clone()),
        );
        extra.insert(
            "measure_numbers".into(),
            Value::from(self.measure_numbers.clone()),
        );
        extra.insert(
            "measures_to_force_display".into(),
            Value::from(self.measures_to_force_display()),
        );
        extra
    }

    fn restore_extra_state(&mut self, extra: &Map<String, Value>) -> TimelineResult<()> {
        if let Some(pattern) = extra_field::<Vec<usize>>(extra, "beat_pattern")? {
            check_pattern(&pattern)?;
            self.beat_pattern = pattern;
        }
        self.beats_in_measure = extra_field(extra, "beats_in_measure")?.unwrap_or_default();
        self.measure_numbers = extra_field(extra, "measure_numbers")?.unwrap_or_default();
        self.measures_to_force_display =
            extra_field::<Vec<usize>>(extra, "measures_to_force_display")?
                .unwrap_or_default()
                .into_iter()
                .collect();
        Ok(())
    }

    fn on_components_changed(&mut self) {
        self.recalculate_measures();
    }
}
