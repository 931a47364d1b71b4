// HarmonyTimeline - chord symbols and key changes over one or more levels

use serde_json::{Map, Value};

use crate::component::manager::ValidationPolicy;
use crate::component::{
    Component, ComponentData, ComponentId, ComponentKind, Field, FieldValue, Harmony, Mode,
};
use crate::error::{ComponentResult, TimelineError, TimelineResult};
use crate::timeline::{Timeline, TimelineCore, extra_field};

#[derive(Debug)]
pub struct HarmonyTimeline {
    core: TimelineCore,
    /// Number of stacked analysis levels shown
    level_count: u32,
}

impl HarmonyTimeline {
    pub fn new(core: TimelineCore) -> Self {
        let mut timeline = Self {
            core,
            level_count: 1,
        };
        timeline.apply_level_count(1);
        timeline
    }

    pub fn with_level_count(mut self, level_count: u32) -> Self {
        self.apply_level_count(level_count.max(1));
        self
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    pub fn set_level_count(&mut self, level_count: u32) -> TimelineResult<()> {
        if level_count == 0 {
            return Err(TimelineError::InvalidArgument(
                "a harmony timeline needs at least one level".to_string(),
            ));
        }
        let highest = self.highest_level();
        if level_count < highest {
            return Err(TimelineError::InvalidArgument(format!(
                "components use level {}, cannot reduce level count to {}",
                highest, level_count
            )));
        }
        self.apply_level_count(level_count);
        self.notify_changed("level_count");
        Ok(())
    }

    /// The manager enforces the bound on create, attribute change and load
    fn apply_level_count(&mut self, level_count: u32) {
        self.level_count = level_count;
        self.core
            .components
            .set_policy(ValidationPolicy::Levels { level_count });
    }

    fn highest_level(&self) -> u32 {
        self.core
            .components
            .iter()
            .filter_map(|c| match c.data().get(Field::Level) {
                Some(FieldValue::Int(level)) => Some(level as u32),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn create_harmony(&mut self, harmony: Harmony) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::Harmony(harmony))
    }

    pub fn create_mode(&mut self, mode: Mode) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::Mode(mode))
    }

    pub fn harmonies(&self) -> Vec<&Component> {
        self.core
            .components
            .get_components_by_condition(|_| true, ComponentKind::Harmony)
    }

    pub fn modes(&self) -> Vec<&Component> {
        self.core
            .components
            .get_components_by_condition(|_| true, ComponentKind::Mode)
    }

    /// Latest mode at or before `time`, on any level
    pub fn mode_at(&self, time: f64) -> Option<&Component> {
        self.modes()
            .into_iter()
            .filter(|c| c.time() <= time)
            .max_by(|a, b| a.time().total_cmp(&b.time()))
    }
}

impl Timeline for HarmonyTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }

    fn extra_state(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("level_count".into(), Value::from(self.level_count));
        extra
    }

    fn restore_extra_state(&mut self, extra: &Map<String, Value>) -> TimelineResult<()> {
        if let Some(level_count) = extra_field::<u32>(extra, "level_count")? {
            self.apply_level_count(level_count.max(1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use crate::timeline::TimelineKind;

    fn harmony_timeline() -> HarmonyTimeline {
        let core = TimelineCore::new(1, TimelineKind::Harmony, "", 48, Services::with_duration(60.0));
        HarmonyTimeline::new(core)
    }

    #[test]
    fn test_mode_at() {
        let mut timeline = harmony_timeline();
        timeline.create_mode(Mode::new(0.0, 0, "major")).unwrap();
        timeline.create_mode(Mode::new(20.0, 5, "minor")).unwrap();
        timeline.create_harmony(Harmony::new(10.0, 4, "major")).unwrap();

        assert_eq!(timeline.harmonies().len(), 1);
        assert_eq!(timeline.modes().len(), 2);
        assert_eq!(timeline.mode_at(15.0).map(|c| c.time()), Some(0.0));
        assert_eq!(timeline.mode_at(25.0).map(|c| c.time()), Some(20.0));
    }

    #[test]
    fn test_level_bounds() {
        let mut timeline = harmony_timeline();
        let mut upper = Harmony::new(1.0, 0, "minor");
        upper.level = 2;
        assert!(timeline.create_harmony(upper.clone()).is_err());

        assert!(timeline.set_level_count(0).is_err());
        timeline.set_level_count(2).unwrap();
        timeline.create_harmony(upper).unwrap();

        let state = timeline.get_state().unwrap();
        assert_eq!(state.extra["level_count"], 2);
        let mut restored = harmony_timeline();
        restored.restore_state(&state).unwrap();
        assert_eq!(restored.level_count(), 2);
        assert_eq!(restored.harmonies().len(), 1);

        // Levels in use pin the count
        assert!(restored.set_level_count(1).is_err());
        assert_eq!(restored.level_count(), 2);
    }

    #[test]
    fn test_level_bound_on_every_entry_point() {
        let mut timeline = harmony_timeline();
        let mut upper = Harmony::new(1.0, 0, "minor");
        upper.level = 9;
        assert!(timeline
            .create_timeline_component(ComponentData::Harmony(upper.clone()))
            .is_err());
        assert!(timeline.harmonies().is_empty());

        let id = timeline.create_harmony(Harmony::new(2.0, 4, "major")).unwrap();
        assert!(timeline
            .set_component_data(id, Field::Level, FieldValue::Int(7))
            .is_err());
        assert_eq!(
            timeline.components().get_component(id).unwrap().get_data(Field::Level),
            Ok(FieldValue::Int(1))
        );

        // A saved level above the saved count is reported, not loaded
        let mut state = timeline.get_state().unwrap();
        state.components.insert(
            ComponentId::MAX,
            serde_json::to_value(ComponentData::Harmony(upper)).unwrap(),
        );
        let mut restored = harmony_timeline();
        let report = restored.restore_state(&state).unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("exceeds level count 1"));

        let timeline = timeline.with_level_count(7);
        assert_eq!(timeline.core.components.policy(), ValidationPolicy::Levels { level_count: 7 });
    }
}
