// Notifications emitted by timelines for external listeners (UI, undo log)

use crate::component::{ComponentId, Field};
use crate::timeline::{TimelineId, TimelineKind};

/// Fire-and-forget notification about a change in the document
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    TimelineCreated {
        kind: TimelineKind,
        timeline: TimelineId,
    },
    TimelineDeleted {
        kind: TimelineKind,
        timeline: TimelineId,
    },
    /// A timeline attribute (name, height, visibility, ordinal) changed
    TimelineChanged {
        kind: TimelineKind,
        timeline: TimelineId,
        attribute: &'static str,
    },
    ComponentCreated {
        kind: TimelineKind,
        timeline: TimelineId,
        component: ComponentId,
    },
    ComponentDeleted {
        kind: TimelineKind,
        timeline: TimelineId,
        component: ComponentId,
    },
    ComponentChanged {
        kind: TimelineKind,
        timeline: TimelineId,
        component: ComponentId,
        field: Field,
    },
    /// Measure bookkeeping of a beat timeline was recomputed
    MeasuresChanged { timeline: TimelineId },
}

impl TimelineEvent {
    pub fn timeline(&self) -> TimelineId {
        match self {
            TimelineEvent::TimelineCreated { timeline, .. }
            | TimelineEvent::TimelineDeleted { timeline, .. }
            | TimelineEvent::TimelineChanged { timeline, .. }
            | TimelineEvent::ComponentCreated { timeline, .. }
            | TimelineEvent::ComponentDeleted { timeline, .. }
            | TimelineEvent::ComponentChanged { timeline, .. }
            | TimelineEvent::MeasuresChanged { timeline } => *timeline,
        }
    }
}
