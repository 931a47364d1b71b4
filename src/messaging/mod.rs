// Messaging - change notifications from the timeline core to its listeners

pub mod channels;
pub mod event;

pub use channels::{ChannelEventSink, EventConsumer, EventProducer, create_event_channel};
pub use event::TimelineEvent;
