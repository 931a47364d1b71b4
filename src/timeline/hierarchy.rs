// HierarchyTimeline - nested segmentation (sections, phrases, motifs)
//
// Parent/children links are stored on both ends and kept symmetric by the
// operations here: splitting, merging, re-parenting and deletion.

use crate::component::{Component, ComponentData, ComponentId, Field, FieldValue, Hierarchy};
use crate::error::{ComponentResult, TimelineError, TimelineResult};
use crate::messaging::TimelineEvent;
use crate::timeline::{Timeline, TimelineCore};

#[derive(Debug)]
pub struct HierarchyTimeline {
    core: TimelineCore,
}

impl HierarchyTimeline {
    pub fn new(core: TimelineCore) -> Self {
        Self { core }
    }

    pub fn create_hierarchy(
        &mut self,
        start: f64,
        end: f64,
        level: u32,
        label: &str,
    ) -> ComponentResult<ComponentId> {
        self.create_timeline_component(ComponentData::Hierarchy(Hierarchy::with_label(
            start, end, level, label,
        )))
    }

    pub fn hierarchy(&self, id: ComponentId) -> TimelineResult<&Hierarchy> {
        match self.core.components.get_component(id)?.data() {
            ComponentData::Hierarchy(h) => Ok(h),
            _ => Err(TimelineError::ComponentNotFound(id)),
        }
    }

    pub fn parent_of(&self, id: ComponentId) -> Option<ComponentId> {
        self.hierarchy(id).ok().and_then(|h| h.parent)
    }

    pub fn children_of(&self, id: ComponentId) -> Vec<ComponentId> {
        self.hierarchy(id)
            .map(|h| h.children.clone())
            .unwrap_or_default()
    }

    fn update_hierarchy<F>(&mut self, id: ComponentId, f: F) -> TimelineResult<()>
    where
        F: FnOnce(&mut Hierarchy),
    {
        self.core.components.update_in_place(id, |data| {
            if let ComponentData::Hierarchy(h) = data {
                f(h);
            }
        })
    }

    fn notify_component_changed(&self, id: ComponentId, field: Field) {
        self.core.notify(TimelineEvent::ComponentChanged {
            kind: self.kind(),
            timeline: self.core.id,
            component: id,
            field,
        });
    }

    /// Cut a hierarchy in two at `time`, returning the id of the right piece
    ///
    /// Children starting at or after `time` move to the new piece; a child
    /// straddling `time` makes the split fail.
    pub fn split(&mut self, id: ComponentId, time: f64) -> TimelineResult<ComponentId> {
        let original = self.hierarchy(id)?.clone();
        if !(original.start < time && time < original.end) {
            return Err(TimelineError::InvalidArgument(format!(
                "split time {} is outside ({}, {})",
                time, original.start, original.end
            )));
        }
        for child in &original.children {
            let child_span = self.hierarchy(*child)?;
            if child_span.start < time && time < child_span.end {
                return Err(TimelineError::InvalidArgument(format!(
                    "child {} straddles split time {}",
                    child, time
                )));
            }
        }

        self.core
            .components
            .set_component_data(id, Field::End, FieldValue::Float(time))?;
        let piece = Hierarchy {
            start: time,
            end: original.end,
            children: Vec::new(),
            ..original.clone()
        };
        let piece_id = match self.create_timeline_component(ComponentData::Hierarchy(piece)) {
            Ok(piece_id) => piece_id,
            Err(e) => {
                let end = original.end;
                self.update_hierarchy(id, |h| h.end = end)?;
                return Err(e.into());
            }
        };

        let mut left = Vec::new();
        let mut right = Vec::new();
        for child in &original.children {
            if self.hierarchy(*child)?.start >= time {
                right.push(*child);
            } else {
                left.push(*child);
            }
        }
        for child in &right {
            self.update_hierarchy(*child, |h| h.parent = Some(piece_id))?;
        }
        self.update_hierarchy(id, |h| h.children = left)?;
        self.update_hierarchy(piece_id, |h| h.children = right)?;
        if let Some(parent) = original.parent {
            self.update_hierarchy(parent, |h| h.children.push(piece_id))?;
        }

        self.notify_component_changed(id, Field::End);
        log::debug!("Split hierarchy {} at {} into {}", id, time, piece_id);
        Ok(piece_id)
    }

    /// Merge hierarchies of one level and parent into the earliest of them
    ///
    /// No other hierarchy of that level may lie between them. Repeated ids
    /// count once. Returns the id of the merged hierarchy.
    pub fn merge(&mut self, ids: &[ComponentId]) -> TimelineResult<ComponentId> {
        let mut unique: Vec<ComponentId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.len() < 2 {
            return Err(TimelineError::InvalidArgument(
                "merge needs at least two hierarchies".to_string(),
            ));
        }
        let mut parts = Vec::with_capacity(unique.len());
        for id in &unique {
            parts.push((*id, self.hierarchy(*id)?.clone()));
        }
        parts.sort_by(|a, b| a.1.start.total_cmp(&b.1.start));

        let (kept, first) = parts[0].clone();
        if parts
            .iter()
            .any(|(_, h)| h.level != first.level || h.parent != first.parent)
        {
            return Err(TimelineError::InvalidArgument(
                "merged hierarchies must share level and parent".to_string(),
            ));
        }
        let end = parts
            .iter()
            .map(|(_, h)| h.end)
            .fold(first.end, f64::max);
        let in_between = self.core.components.iter().any(|c| {
            !unique.contains(&c.id())
                && matches!(c.data(), ComponentData::Hierarchy(h)
                    if h.level == first.level && h.overlaps(first.start, end))
        });
        if in_between {
            return Err(TimelineError::InvalidArgument(
                "merged hierarchies must be contiguous".to_string(),
            ));
        }

        let mut children = Vec::new();
        for (id, part) in &parts[1..] {
            self.core.components.delete_component(*id)?;
            self.core.notify(TimelineEvent::ComponentDeleted {
                kind: self.kind(),
                timeline: self.core.id,
                component: *id,
            });
            if let Some(parent) = part.parent {
                let removed = *id;
                self.update_hierarchy(parent, |h| h.children.retain(|c| *c != removed))?;
            }
            children.extend(part.children.iter().copied());
        }
        for child in &children {
            self.update_hierarchy(*child, |h| h.parent = Some(kept))?;
        }
        self.update_hierarchy(kept, |h| {
            h.end = end;
            h.children.extend(children);
        })?;

        self.notify_component_changed(kept, Field::End);
        Ok(kept)
    }

    /// Link `child` under `parent`, or detach it with `None`
    ///
    /// The parent must sit on a higher level and contain the child's span.
    pub fn set_parent(
        &mut self,
        child: ComponentId,
        parent: Option<ComponentId>,
    ) -> TimelineResult<()> {
        let child_span = self.hierarchy(child)?.clone();
        if let Some(parent) = parent {
            let parent_span = self.hierarchy(parent)?;
            if parent_span.level <= child_span.level {
                return Err(TimelineError::InvalidArgument(format!(
                    "parent level {} must exceed child level {}",
                    parent_span.level, child_span.level
                )));
            }
            if !parent_span.contains_span(child_span.start, child_span.end) {
                return Err(TimelineError::InvalidArgument(format!(
                    "parent {} does not contain child {}",
                    parent, child
                )));
            }
        }

        if let Some(old) = child_span.parent
            && self.core.components.contains(old)
        {
            self.update_hierarchy(old, |h| h.children.retain(|c| *c != child))?;
        }
        self.update_hierarchy(child, |h| h.parent = parent)?;
        if let Some(parent) = parent {
            self.update_hierarchy(parent, |h| {
                if !h.children.contains(&child) {
                    h.children.push(child);
                }
            })?;
        }
        self.notify_component_changed(child, Field::Parent);
        Ok(())
    }
}

impl Timeline for HierarchyTimeline {
    fn core(&self) -> &TimelineCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimelineCore {
        &mut self.core
    }

    fn on_component_deleted(&mut self, component: &Component) {
        let ComponentData::Hierarchy(deleted) = component.data() else {
            return;
        };
        let id = component.id();
        if let Some(parent) = deleted.parent
            && self.core.components.contains(parent)
        {
            let _ = self.update_hierarchy(parent, |h| h.children.retain(|c| *c != id));
        }
        for child in &deleted.children {
            if self.parent_of(*child) == Some(id) {
                let _ = self.update_hierarchy(*child, |h| h.parent = None);
            }
        }
    }
}
