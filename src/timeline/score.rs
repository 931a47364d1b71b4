// ScoreTimeline - notes of a symbolic score aligned to the media

use crate::component::{Component, ComponentData, ComponentId, Note};
use crate::error::ComponentResult;
use crate::timeline::{Timeline, TimelineCore};

#[derive(Debug)]
pub struct ScoreTimeline {
    core: TimelineCore,
}

impl ScoreTimeline {
    pub fn new(core: TimelineCore) -> Self {
        Self { core }
    }

    pub fn create_note(&mut self, note: Note) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::Note(note))
    }

    /// Notes sounding at some point of `[start, end]`, by start time
    pub fn notes_in_range(&self, start: f64, end: f64) -> Vec<&Component> {
        self.core
            .components
            .iter()
            .filter(|c| match c.data() {
                ComponentData::Note(note) => note.start <= end && start <= note.end,
                _ => false,
            })
            .collect()
    }

    /// Number of staves referenced by the notes
    pub fn staff_count(&self) -> usize {
        self.core
            .components
            .iter()
            .filter_map(|c| match c.data() {
                ComponentData::Note(note) => Some(note.staff_index as usize + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl Timeline for ScoreTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }
}
