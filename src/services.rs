// Collaborators injected into timelines: id generation, media duration and
// the event sink. Passed explicitly through constructors, never looked up
// from a global registry.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::messaging::TimelineEvent;

/// Source of process-unique ids for components and timelines
pub trait IdProvider {
    fn next_id(&self) -> u64;

    /// Make sure `id`, taken from loaded state, is never handed out again
    fn reserve(&self, _id: u64) {}
}

/// Current media duration in seconds, used by time-bound validators
pub trait MediaDuration {
    fn current_media_duration(&self) -> f64;
}

/// Receiver of change notifications; the core never waits on it
pub trait EventSink {
    fn notify(&self, event: TimelineEvent);
}

/// Global id generator (atomic, shared by every provider in the process)
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a process-unique id
pub fn generate_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// IdProvider backed by the process-wide counter
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessIdProvider;

impl IdProvider for ProcessIdProvider {
    fn next_id(&self) -> u64 {
        generate_id()
    }

    fn reserve(&self, id: u64) {
        NEXT_ID.fetch_max(id.saturating_add(1), Ordering::Relaxed);
    }
}

/// Settable media duration, updated by the player when new media is loaded
#[derive(Debug, Default)]
pub struct MediaClock {
    duration: Cell<f64>,
}

impl MediaClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: Cell::new(duration),
        }
    }

    pub fn set_duration(&self, duration: f64) {
        self.duration.set(duration);
    }
}

impl MediaDuration for MediaClock {
    fn current_media_duration(&self) -> f64 {
        self.duration.get()
    }
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn notify(&self, _event: TimelineEvent) {}
}

/// Bundle of collaborators shared by a document's timelines
#[derive(Clone)]
pub struct Services {
    pub ids: Rc<dyn IdProvider>,
    pub media: Rc<dyn MediaDuration>,
    pub events: Rc<dyn EventSink>,
}

impl Services {
    pub fn new(
        ids: Rc<dyn IdProvider>,
        media: Rc<dyn MediaDuration>,
        events: Rc<dyn EventSink>,
    ) -> Self {
        Self { ids, media, events }
    }

    /// Process ids, a fixed duration and no listeners
    pub fn with_duration(duration: f64) -> Self {
        Self::new(
            Rc::new(ProcessIdProvider),
            Rc::new(MediaClock::new(duration)),
            Rc::new(NullEventSink),
        )
    }

    pub fn next_id(&self) -> u64 {
        self.ids.next_id()
    }

    pub fn reserve_id(&self, id: u64) {
        self.ids.reserve(id);
    }

    pub fn media_duration(&self) -> f64 {
        self.media.current_media_duration()
    }

    pub fn notify(&self, event: TimelineEvent) {
        self.events.notify(event);
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("media_duration", &self.media_duration())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_reserved_id_is_skipped() {
        let provider = ProcessIdProvider;
        let reserved = provider.next_id() + 1000;
        provider.reserve(reserved);
        assert!(provider.next_id() > reserved);
    }

    #[test]
    fn test_media_clock() {
        let clock = MediaClock::new(10.0);
        assert_eq!(clock.current_media_duration(), 10.0);
        clock.set_duration(42.5);
        assert_eq!(clock.current_media_duration(), 42.5);
    }
}
