// Measure bookkeeping - pure functions over the per-measure sequences
//
// A measure is only a count of beats; boundaries, extension and trimming are
// computed from `beats_in_measure` and the beat pattern on demand.

/// Displayed measure number; may repeat or start at 0 (pickup measures)
pub type MeasureNumber = i64;

/// Exclusive prefix sums: index of the first beat of each measure
pub fn derive_measure_boundaries(beats_in_measure: &[usize]) -> Vec<usize> {
    let mut boundaries = Vec::with_capacity(beats_in_measure.len());
    let mut offset = 0;
    for count in beats_in_measure {
        boundaries.push(offset);
        offset += count;
    }
    boundaries
}

/// Beat count the pattern assigns to the measure at `index`
pub fn pattern_length_at(pattern: &[usize], index: usize) -> usize {
    if pattern.is_empty() {
        return 1;
    }
    pattern[index % pattern.len()].max(1)
}

/// Add `delta` beats at the end, following the pattern cycle
///
/// A last measure holding fewer beats than its pattern slot is filled before
/// any new measure is started. The final new measure may stay partial.
pub fn extend_measures(beats_in_measure: &mut Vec<usize>, pattern: &[usize], mut delta: usize) {
    if let Some(last_index) = beats_in_measure.len().checked_sub(1) {
        let expected = pattern_length_at(pattern, last_index);
        let last = &mut beats_in_measure[last_index];
        if *last < expected {
            let fill = (expected - *last).min(delta);
            *last += fill;
            delta -= fill;
        }
    }

    while delta > 0 {
        let take = pattern_length_at(pattern, beats_in_measure.len()).min(delta);
        beats_in_measure.push(take);
        delta -= take;
    }
}

/// Remove `excess` beats from the end, emptying the final measures first
pub fn trim_measures(beats_in_measure: &mut Vec<usize>, mut excess: usize) {
    while excess > 0 {
        let Some(last) = beats_in_measure.last_mut() else {
            break;
        };
        if *last <= excess {
            excess -= *last;
            beats_in_measure.pop();
        } else {
            *last -= excess;
            excess = 0;
        }
    }
    // Empty trailing measures can only come from loaded state
    while beats_in_measure.last() == Some(&0) {
        beats_in_measure.pop();
    }
}

/// Fit the numbers to `measure_count` entries, counting up from the last one
pub fn fit_measure_numbers(numbers: &mut Vec<MeasureNumber>, measure_count: usize) {
    numbers.truncate(measure_count);
    while numbers.len() < measure_count {
        let next = numbers.last().map_or(1, |n| n + 1);
        numbers.push(next);
    }
}

/// Renumber measures after `index` as previous + 1, up to the next pinned one
pub fn propagate_measure_numbers(
    numbers: &mut [MeasureNumber],
    index: usize,
    is_pinned: impl Fn(usize) -> bool,
) {
    for i in index + 1..numbers.len() {
        if is_pinned(i) {
            break;
        }
        numbers[i] = numbers[i - 1] + 1;
    }
}

/// Measure containing `beat_index` and the beat's 0-based position in it
pub fn locate_beat(boundaries: &[usize], beat_index: usize) -> Option<(usize, usize)> {
    let measure = boundaries.partition_point(|start| *start <= beat_index);
    let measure = measure.checked_sub(1)?;
    Some((measure, beat_index - boundaries[measure]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_exclusive_prefix_sums() {
        assert_eq!(derive_measure_boundaries(&[4, 3, 4]), vec![0, 4, 7]);
        assert!(derive_measure_boundaries(&[]).is_empty());
    }

    #[test]
    fn test_extend_from_empty() {
        let mut measures = Vec::new();
        extend_measures(&mut measures, &[4], 10);
        assert_eq!(measures, vec![4, 4, 2]);
    }

    #[test]
    fn test_extend_fills_partial_measure_first() {
        let mut measures = vec![4, 2];
        extend_measures(&mut measures, &[4], 3);
        assert_eq!(measures, vec![4, 4, 1]);
    }

    #[test]
    fn test_extend_continues_pattern_cycle() {
        // Pattern 3, 2: measure 2 is a 3 slot, measure 3 a 2 slot
        let mut measures = vec![3, 2];
        extend_measures(&mut measures, &[3, 2], 6);
        assert_eq!(measures, vec![3, 2, 3, 2, 1]);

        // The partial last measure sits on a 3 slot after wraparound
        let mut measures = vec![3, 2, 1];
        extend_measures(&mut measures, &[3, 2], 2);
        assert_eq!(measures, vec![3, 2, 3]);
    }

    #[test]
    fn test_extend_keeps_manually_enlarged_measure() {
        let mut measures = vec![6];
        extend_measures(&mut measures, &[4], 4);
        assert_eq!(measures, vec![6, 4]);
    }

    #[test]
    fn test_trim_reduces_partial_measure_first() {
        let mut measures = vec![4, 4, 2];
        trim_measures(&mut measures, 1);
        assert_eq!(measures, vec![4, 4, 1]);
        trim_measures(&mut measures, 3);
        assert_eq!(measures, vec![4, 2]);
        trim_measures(&mut measures, 10);
        assert!(measures.is_empty());
    }

    #[test]
    fn test_fit_measure_numbers() {
        let mut numbers = vec![0, 1];
        fit_measure_numbers(&mut numbers, 4);
        assert_eq!(numbers, vec![0, 1, 2, 3]);
        fit_measure_numbers(&mut numbers, 1);
        assert_eq!(numbers, vec![0]);

        let mut numbers = Vec::new();
        fit_measure_numbers(&mut numbers, 2);
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_propagation_stops_at_pinned() {
        let mut numbers = vec![1, 2, 3, 10, 11];
        numbers[0] = 5;
        propagate_measure_numbers(&mut numbers, 0, |i| i == 3);
        assert_eq!(numbers, vec![5, 6, 7, 10, 11]);
    }

    #[test]
    fn test_locate_beat() {
        let boundaries = derive_measure_boundaries(&[2, 3]);
        assert_eq!(locate_beat(&boundaries, 0), Some((0, 0)));
        assert_eq!(locate_beat(&boundaries, 1), Some((0, 1)));
        assert_eq!(locate_beat(&boundaries, 2), Some((1, 0)));
        assert_eq!(locate_beat(&boundaries, 4), Some((1, 2)));
        assert_eq!(locate_beat(&[], 0), None);
    }
}
