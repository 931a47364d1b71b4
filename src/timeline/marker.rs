// MarkerTimeline - labelled points in time

use crate::component::{Component, ComponentData, ComponentId, Marker};
use crate::error::ComponentResult;
use crate::timeline::{Timeline, TimelineCore};

#[derive(Debug)]
pub struct MarkerTimeline {
    core: TimelineCore,
}

impl MarkerTimeline {
    pub fn new(core: TimelineCore) -> Self {
        Self { core }
    }

    pub fn create_marker(&mut self, time: f64, label: &str) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::Marker(Marker::with_label(time, label)))
    }

    /// Markers with `start <= time <= end`, in time order
    pub fn markers_in_range(&self, start: f64, end: f64) -> Vec<&Component> {
        self.core
            .components
            .iter()
            .filter(|c| (start..=end).contains(&c.time()))
            .collect()
    }
}

impl Timeline for MarkerTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use crate::timeline::TimelineKind;

    #[test]
    fn test_markers_in_range() {
        let core = TimelineCore::new(1, TimelineKind::Marker, "", 40, Services::with_duration(10.0));
        let mut timeline = MarkerTimeline::new(core);
        for (time, label) in [(1.0, "a"), (4.0, "b"), (7.0, "c")] {
            timeline.create_marker(time, label).unwrap();
        }
        let found = timeline.markers_in_range(2.0, 7.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].time(), 4.0);
    }
}
