// SliderTimeline - playback position lane, holds no components

use crate::timeline::{Timeline, TimelineCore};

#[derive(Debug)]
pub struct SliderTimeline {
    core: TimelineCore,
}

impl SliderTimeline {
    pub fn new(core: TimelineCore) -> Self {
        Self { core }
    }
}

impl Timeline for SliderTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }
}
