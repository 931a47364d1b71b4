use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use timeline_annotations::{
    BeatTimeline, FillMode, Services, Timeline, TimelineCore, TimelineKind,
    derive_measure_boundaries,
};

fn filled_beat_timeline(beats: usize) -> BeatTimeline {
    let duration = beats as f64 * 0.5;
    let core = TimelineCore::new(
        1,
        TimelineKind::Beat,
        "bench",
        30,
        Services::with_duration(duration),
    );
    let mut timeline = BeatTimeline::new(core, vec![4, 3]).unwrap();
    timeline.fill_with_beats(FillMode::Count(beats)).unwrap();
    timeline
}

/// Benchmark measure bookkeeping after a beat set change
fn bench_recalculate_measures(c: &mut Criterion) {
    let mut group = c.benchmark_group("recalculate_measures");

    for beats in [100, 1_000, 10_000] {
        let mut timeline = filled_beat_timeline(beats);
        group.bench_with_input(BenchmarkId::from_parameter(beats), &beats, |b, _| {
            b.iter(|| {
                timeline.recalculate_measures();
                black_box(timeline.measure_count());
            });
        });
    }
    group.finish();
}

/// Benchmark measure number lookup (used by every measure-addressed import row)
fn bench_get_time_by_measure(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_time_by_measure");

    for beats in [100, 1_000, 10_000] {
        let timeline = filled_beat_timeline(beats);
        let middle = (timeline.measure_count() / 2) as i64;
        group.bench_with_input(BenchmarkId::from_parameter(beats), &middle, |b, &number| {
            b.iter(|| black_box(timeline.get_time_by_measure(number, 0.5).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark beat insertion in the middle of a long timeline
fn bench_insert_and_delete_beat(c: &mut Criterion) {
    let mut timeline = filled_beat_timeline(5_000);
    let time = 1_250.25;

    c.bench_function("insert_delete_beat_5000", |b| {
        b.iter(|| {
            let id = timeline.create_beat(black_box(time)).unwrap();
            timeline.delete_timeline_component(id).unwrap();
        });
    });
}

fn bench_measure_boundaries(c: &mut Criterion) {
    let beats_in_measure: Vec<usize> = (0..10_000).map(|i| 3 + i % 2).collect();
    c.bench_function("derive_measure_boundaries_10000", |b| {
        b.iter(|| black_box(derive_measure_boundaries(black_box(&beats_in_measure))));
    });
}

criterion_group!(
    benches,
    bench_recalculate_measures,
    bench_get_time_by_measure,
    bench_insert_and_delete_beat,
    bench_measure_boundaries
);
criterion_main!(benches);
