// Lock-free event channel

use std::sync::Mutex;

use ringbuf::traits::Producer;
use ringbuf::{HeapRb, traits::Split};

use crate::messaging::event::TimelineEvent;
use crate::services::EventSink;

pub type EventProducer = ringbuf::HeapProd<TimelineEvent>;
pub type EventConsumer = ringbuf::HeapCons<TimelineEvent>;

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<TimelineEvent>::new(capacity);
    rb.split()
}

/// EventSink pushing into a ring buffer drained by the UI
///
/// Notifications are fire-and-forget: when the buffer is full the event is
/// dropped and a warning is logged.
pub struct ChannelEventSink {
    producer: Mutex<EventProducer>,
}

impl ChannelEventSink {
    pub fn new(producer: EventProducer) -> Self {
        Self {
            producer: Mutex::new(producer),
        }
    }

    /// Create a sink together with the consumer end of its channel
    pub fn with_capacity(capacity: usize) -> (Self, EventConsumer) {
        let (producer, consumer) = create_event_channel(capacity);
        (Self::new(producer), consumer)
    }
}

impl EventSink for ChannelEventSink {
    fn notify(&self, event: TimelineEvent) {
        match self.producer.lock() {
            Ok(mut producer) => {
                if let Err(event) = producer.try_push(event) {
                    log::warn!("Event channel full, dropping {:?}", event);
                }
            }
            Err(_) => log::warn!("Event channel lock poisoned, dropping {:?}", event),
        }
    }
}
