//! Document state and notification tests
//!
//! Exercises whole-document snapshots through their JSON text form,
//! ordinal bookkeeping, the slider singleton rule and the event channel.

use std::rc::Rc;

use ringbuf::traits::Consumer;
use timeline_annotations::services::ProcessIdProvider;
use timeline_annotations::{
    ChannelEventSink, ComponentData, DocumentState, EventConsumer, Marker, MediaClock, Services,
    Timeline, TimelineError, TimelineEvent, TimelineKind, TimelineOptions, Timelines,
};

fn document() -> Timelines {
    Timelines::new(Services::with_duration(120.0))
}

fn observed_document(capacity: usize) -> (Timelines, EventConsumer) {
    let (sink, consumer) = ChannelEventSink::with_capacity(capacity);
    let services = Services::new(
        Rc::new(ProcessIdProvider),
        Rc::new(MediaClock::new(120.0)),
        Rc::new(sink),
    );
    (Timelines::new(services), consumer)
}

fn drain(consumer: &mut EventConsumer) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    while let Some(event) = consumer.try_pop() {
        events.push(event);
    }
    events
}

/// Builds a document with one timeline of each annotated kind
fn populated_document() -> Timelines {
    let mut doc = document();

    let beats = doc
        .create_timeline(
            TimelineKind::Beat,
            TimelineOptions::named("Beats").with_beat_pattern(vec![3]),
        )
        .unwrap();
    let beat_timeline = doc.beat_mut(beats).unwrap();
    for i in 0..10 {
        beat_timeline.create_beat(i as f64 * 0.5).unwrap();
    }
    beat_timeline.set_measure_number(0, 0).unwrap();

    let markers = doc
        .create_timeline(TimelineKind::Marker, TimelineOptions::named("Cues"))
        .unwrap();
    let marker_timeline = doc.get_mut(markers).unwrap().as_timeline_mut();
    for (time, label) in [(1.0, "intro"), (30.0, "verse"), (60.0, "chorus")] {
        marker_timeline
            .create_timeline_component(ComponentData::Marker(Marker::with_label(time, label)))
            .unwrap();
    }

    let form = doc
        .create_timeline(TimelineKind::Hierarchy, TimelineOptions::named("Form"))
        .unwrap();
    let hierarchy = doc.get_mut(form).unwrap().as_hierarchy_mut().unwrap();
    let section = hierarchy.create_hierarchy(0.0, 60.0, 2, "A").unwrap();
    let first = hierarchy.create_hierarchy(0.0, 30.0, 1, "a").unwrap();
    let second = hierarchy.create_hierarchy(30.0, 60.0, 1, "a'").unwrap();
    hierarchy.set_parent(first, Some(section)).unwrap();
    hierarchy.set_parent(second, Some(section)).unwrap();

    doc
}

#[test]
fn test_round_trip_through_json_text() {
    let doc = populated_document();
    let text = serde_json::to_string(&doc.get_state().unwrap()).unwrap();

    let state: DocumentState = serde_json::from_str(&text).unwrap();
    let mut restored = document();
    let report = restored.restore_state(&state).unwrap();
    assert!(report.is_ok(), "{:?}", report.errors);
    assert_eq!(report.created, 10 + 3 + 3);

    // Timeline ids and order survive
    assert_eq!(restored.ids(), doc.ids());
    let names: Vec<String> = restored
        .iter()
        .map(|t| t.as_timeline().name().to_string())
        .collect();
    assert_eq!(names, vec!["Beats", "Cues", "Form"]);

    // Metric bookkeeping survives, including the pinned pickup measure
    let beats = restored.primary_beat_timeline().unwrap();
    assert_eq!(beats.beat_pattern(), &[3]);
    assert_eq!(beats.beats_in_measure(), &[3, 3, 3, 1]);
    assert_eq!(beats.measure_numbers(), &[0, 1, 2, 3]);
    assert_eq!(beats.measures_to_force_display(), vec![0]);

    // Marker payloads are identical; only component ids differ
    let markers = doc.ids()[1];
    let original = doc.get(markers).unwrap().as_timeline().get_state().unwrap();
    let reloaded = restored.get(markers).unwrap().as_timeline().get_state().unwrap();
    assert_eq!(
        original.components.values().collect::<Vec<_>>(),
        reloaded.components.values().collect::<Vec<_>>()
    );
}

#[test]
fn test_hierarchy_links_are_remapped_on_restore() {
    let doc = populated_document();
    let form = doc.ids()[2];
    let mut restored = document();
    restored.restore_state(&doc.get_state().unwrap()).unwrap();

    let hierarchy = restored.get(form).unwrap().as_hierarchy().unwrap();
    let components = hierarchy.components();
    let section = components
        .iter()
        .find(|c| hierarchy.hierarchy(c.id()).unwrap().level == 2)
        .unwrap()
        .id();

    let children = hierarchy.children_of(section);
    assert_eq!(children.len(), 2);
    for child in children {
        assert!(components.contains(child));
        assert_eq!(hierarchy.parent_of(child), Some(section));
    }

    // Fresh component ids: nothing points into the old document
    let old_ids = doc.get(form).unwrap().as_timeline().components().ids();
    assert!(components.ids().iter().all(|id| !old_ids.contains(id)));
}

#[test]
fn test_restore_reports_dangling_reference() {
    let doc = populated_document();
    let form = doc.ids()[2];
    let mut state = doc.get_state().unwrap();

    // Drop the parent segment, leaving its children pointing at nothing
    let timeline_state = state.get_mut(&form).unwrap();
    let parent_key = *timeline_state
        .components
        .iter()
        .find(|(_, value)| value["level"] == 2)
        .unwrap()
        .0;
    timeline_state.components.remove(&parent_key);

    let mut restored = document();
    let report = restored.restore_state(&state).unwrap();
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].contains("references missing component"));
    assert_eq!(
        restored.get(form).unwrap().as_timeline().component_count(),
        2
    );
}

#[test]
fn test_restore_skips_second_slider() {
    let mut doc = document();
    let slider = doc
        .create_timeline(TimelineKind::Slider, TimelineOptions::default())
        .unwrap();
    let mut state = doc.get_state().unwrap();
    let mut copy = state[&slider].clone();
    copy.ordinal = 2;
    state.insert(slider + 1_000_000, copy);

    let mut restored = document();
    let report = restored.restore_state(&state).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.ids(), vec![slider]);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("Only one slider timeline"));
}

#[test]
fn test_restore_replaces_existing_content() {
    let source = populated_document();
    let mut target = document();
    target
        .create_timeline(TimelineKind::Slider, TimelineOptions::default())
        .unwrap();
    target
        .create_timeline(TimelineKind::Marker, TimelineOptions::named("stale"))
        .unwrap();

    target.restore_state(&source.get_state().unwrap()).unwrap();
    assert_eq!(target.len(), 3);
    assert!(target.by_name("stale").is_empty());
    assert!(target.by_kind(TimelineKind::Slider).is_empty());
}

#[test]
fn test_ordinals_after_create_move_delete() {
    let mut doc = document();
    let a = doc
        .create_timeline(TimelineKind::Marker, TimelineOptions::named("a"))
        .unwrap();
    let b = doc
        .create_timeline(TimelineKind::Beat, TimelineOptions::named("b"))
        .unwrap();
    let c = doc
        .create_timeline(TimelineKind::Score, TimelineOptions::named("c"))
        .unwrap();

    doc.move_timeline(a, 3).unwrap();
    assert_eq!(doc.ids(), vec![b, c, a]);

    doc.delete_timeline(c).unwrap();
    let ordinals: Vec<(u64, usize)> = doc
        .iter()
        .map(|t| (t.id(), t.as_timeline().ordinal()))
        .collect();
    assert_eq!(ordinals, vec![(b, 1), (a, 2)]);

    // Restore keeps ordinals dense
    let mut restored = document();
    restored.restore_state(&doc.get_state().unwrap()).unwrap();
    assert_eq!(restored.ids(), vec![b, a]);
}

#[test]
fn test_metric_queries_use_primary_beat_timeline() {
    let doc = populated_document();
    let times = doc.get_time_by_measure(1, 0.0).unwrap();
    assert_eq!(times, vec![1.5]);

    let position = doc.get_metric_position(2.25).unwrap().unwrap();
    assert_eq!(position.measure_index, 1);
    assert_eq!(position.measure_number, 1);
    assert_eq!(position.beat_in_measure, 2);
    assert!((position.fraction - 0.5).abs() < 1e-9);
}

#[test]
fn test_events_for_timeline_and_component_changes() {
    let (mut doc, mut consumer) = observed_document(64);
    let beats = doc
        .create_timeline(TimelineKind::Beat, TimelineOptions::default())
        .unwrap();
    let beat = doc.beat_mut(beats).unwrap().create_beat(1.0).unwrap();

    assert_eq!(
        drain(&mut consumer),
        vec![
            TimelineEvent::TimelineCreated {
                kind: TimelineKind::Beat,
                timeline: beats,
            },
            TimelineEvent::ComponentCreated {
                kind: TimelineKind::Beat,
                timeline: beats,
                component: beat,
            },
            TimelineEvent::MeasuresChanged { timeline: beats },
        ]
    );

    doc.delete_timeline(beats).unwrap();
    let events = drain(&mut consumer);
    assert!(events.contains(&TimelineEvent::ComponentDeleted {
        kind: TimelineKind::Beat,
        timeline: beats,
        component: beat,
    }));
    assert_eq!(
        events.last(),
        Some(&TimelineEvent::TimelineDeleted {
            kind: TimelineKind::Beat,
            timeline: beats,
        })
    );
}

#[test]
fn test_rejected_component_emits_nothing() {
    let (mut doc, mut consumer) = observed_document(16);
    let markers = doc
        .create_timeline(TimelineKind::Marker, TimelineOptions::default())
        .unwrap();
    drain(&mut consumer);

    let result = doc
        .get_mut(markers)
        .unwrap()
        .as_timeline_mut()
        .create_timeline_component(ComponentData::Marker(Marker::new(500.0)));
    assert!(result.is_err());
    assert!(drain(&mut consumer).is_empty());
}

#[test]
fn test_unknown_timeline_ids() {
    let mut doc = document();
    assert!(matches!(
        doc.get(42),
        Err(TimelineError::TimelineNotFound(42))
    ));
    assert!(matches!(
        doc.delete_timeline(42),
        Err(TimelineError::TimelineNotFound(42))
    ));
}
