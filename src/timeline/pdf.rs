// PdfTimeline - page turns of a score document

use serde_json::{Map, Value};

use crate::component::manager::ValidationPolicy;
use crate::component::{ComponentData, ComponentId, PdfMarker};
use crate::error::{ComponentResult, TimelineResult};
use crate::timeline::{Timeline, TimelineCore, extra_field};

#[derive(Debug)]
pub struct PdfTimeline {
    core: TimelineCore,
    path: String,
    /// 0 until the document has been opened by the viewer
    page_total: u32,
}

impl PdfTimeline {
    pub fn new(core: TimelineCore, path: impl Into<String>, page_total: u32) -> Self {
        let mut timeline = Self {
            core,
            path: path.into(),
            page_total: 0,
        };
        timeline.apply_page_total(page_total);
        timeline
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn page_total(&self) -> u32 {
        self.page_total
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
        self.notify_changed("path");
    }

    /// Existing markers beyond the new total are kept; new ones are bound-checked
    pub fn set_page_total(&mut self, page_total: u32) {
        self.apply_page_total(page_total);
        self.notify_changed("page_total");
    }

    fn apply_page_total(&mut self, page_total: u32) {
        self.page_total = page_total;
        self.core
            .components
            .set_policy(ValidationPolicy::Pages { page_total });
    }

    pub fn create_page_marker(&mut self, time: f64, page_number: u32) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::PdfMarker(PdfMarker::new(time, page_number)))
    }

    /// Page shown at `time`: the latest marker at or before it, else page 1
    pub fn page_number_at(&self, time: f64) -> u32 {
        self.core
            .components
            .iter()
            .take_while(|c| c.time() <= time)
            .last()
            .and_then(|c| match c.data() {
                ComponentData::PdfMarker(marker) => Some(marker.page_number),
                _ => None,
            })
            .unwrap_or(1)
    }
}

impl Timeline for PdfTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }

    fn extra_state(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert("path".into(), Value::from(self.path.clone()));
        extra.insert("page_total".into(), Value::from(self.page_total));
        extra
    }

    fn restore_extra_state(&mut self, extra: &Map<String, Value>) -> TimelineResult<()> {
        if let Some(path) = extra_field::<String>(extra, "path")? {
            self.path = path;
        }
        if let Some(page_total) = extra_field::<u32>(extra, "page_total")? {
            self.apply_page_total(page_total);
        }
        Ok(())
    }
}
