//! Canonical ordering under attribute changes
//!
//! Random edits to fields in the ordering key must keep the manager's id
//! list sorted by (ordering key, id), and rejected edits must leave the
//! component exactly as it was.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use timeline_annotations::component::OrderingKey;
use timeline_annotations::{
    ComponentData, ComponentId, ComponentManager, Field, FieldValue, Harmony, HarmonyTimeline,
    HierarchyTimeline, Mode, Services, Timeline, TimelineCore, TimelineKind,
};

fn core(kind: TimelineKind) -> TimelineCore {
    TimelineCore::new(1, kind, "", 48, Services::with_duration(100.0))
}

fn assert_canonical_order(manager: &ComponentManager) {
    let mut keyed: Vec<(OrderingKey, ComponentId)> =
        manager.iter().map(|c| (c.ordering_key(), c.id())).collect();
    keyed.sort();
    let expected: Vec<ComponentId> = keyed.into_iter().map(|(_, id)| id).collect();
    assert_eq!(manager.ids(), expected);
}

/// Apply `edits` random changes, checking order after each one
///
/// Returns (accepted, rejected) counts.
fn apply_random_edits<F>(
    timeline: &mut dyn Timeline,
    rng: &mut StdRng,
    edits: usize,
    pick: F,
) -> (usize, usize)
where
    F: Fn(&mut StdRng) -> (Field, FieldValue),
{
    let (mut accepted, mut rejected) = (0, 0);
    for _ in 0..edits {
        let ids = timeline.components().ids();
        let id = ids[rng.gen_range(0..ids.len())];
        let before = timeline.components().get_component(id).unwrap().clone();
        let (field, value) = pick(rng);

        match timeline.set_component_data(id, field, value.clone()) {
            Ok(applied) => {
                assert_eq!(applied, value);
                accepted += 1;
            }
            Err(_) => {
                assert_eq!(timeline.components().get_component(id).unwrap(), &before);
                rejected += 1;
            }
        }
        assert_eq!(timeline.component_count(), ids.len());
        assert_canonical_order(timeline.components());
    }
    (accepted, rejected)
}

#[test]
fn test_hierarchy_edits_keep_canonical_order() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut timeline = HierarchyTimeline::new(core(TimelineKind::Hierarchy));
    for i in 0..12 {
        let start = (i * 8) as f64;
        let level = rng.gen_range(1..=3);
        timeline
            .create_hierarchy(start, start + 4.0, level, "")
            .unwrap();
    }

    let (accepted, rejected) = apply_random_edits(&mut timeline, &mut rng, 500, |rng| {
        // Quantized times make equal keys likely; some land past the duration
        let time = rng.gen_range(0..=220) as f64 * 0.5;
        match rng.gen_range(0..3) {
            0 => (Field::Start, FieldValue::Float(time)),
            1 => (Field::End, FieldValue::Float(time)),
            _ => (Field::Level, FieldValue::Int(rng.gen_range(0..=4))),
        }
    });
    assert!(accepted > 0);
    assert!(rejected > 0);
}

#[test]
fn test_harmony_edits_keep_canonical_order() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut timeline = HarmonyTimeline::new(core(TimelineKind::Harmony)).with_level_count(3);
    for i in 0..10 {
        let time = (i * 5) as f64;
        let level = rng.gen_range(1..=3);
        let data = if i % 2 == 0 {
            let mut harmony = Harmony::new(time, rng.gen_range(0..7), "major");
            harmony.level = level;
            ComponentData::Harmony(harmony)
        } else {
            let mut mode = Mode::new(time, rng.gen_range(0..7), "minor");
            mode.level = level;
            ComponentData::Mode(mode)
        };
        timeline.create_timeline_component(data).unwrap();
    }

    let (accepted, rejected) = apply_random_edits(&mut timeline, &mut rng, 500, |rng| {
        if rng.gen_bool(0.5) {
            // Level 4 is above the level count
            (Field::Level, FieldValue::Int(rng.gen_range(1..=4)))
        } else {
            (Field::Time, FieldValue::Float(rng.gen_range(0..=21) as f64 * 5.0))
        }
    });
    assert!(accepted > 0);
    assert!(rejected > 0);

    let levels_in_range = timeline.components().iter().all(|c| {
        matches!(c.get_data(Field::Level), Ok(FieldValue::Int(level)) if (1..=3).contains(&level))
    });
    assert!(levels_in_range);
}
