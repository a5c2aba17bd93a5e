// Observation domain model and the merge-and-sort accumulator
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One time-stamped reading as shown on a chart.
///
/// `value` is `None` when the backend sent something that is not a number;
/// the chart renders it as a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(time: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { time, value }
    }
}

/// Appends `incoming` to `existing` and sorts the result ascending by time.
///
/// The sort is stable, so observations with equal timestamps keep their
/// arrival order. Nothing is deduplicated: fetching the same page twice
/// yields every record twice.
pub fn merge(mut existing: Vec<Observation>, incoming: Vec<Observation>) -> Vec<Observation> {
    existing.extend(incoming);
    existing.sort_by_key(|obs| obs.time);
    existing
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, value: f64) -> Observation {
        Observation::new(Utc.timestamp_opt(secs, 0).unwrap(), Some(value))
    }

    fn is_sorted(seq: &[Observation]) -> bool {
        seq.windows(2).all(|w| w[0].time <= w[1].time)
    }

    #[test]
    fn test_merge_sorts_across_pages() {
        let first = vec![at(30, 3.0), at(10, 1.0)];
        let merged = merge(Vec::new(), first);
        assert!(is_sorted(&merged));

        let merged = merge(merged, vec![at(20, 2.0), at(5, 0.5)]);
        let values: Vec<_> = merged.iter().map(|o| o.value.unwrap()).collect();
        assert_eq!(values, vec![0.5, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_merge_is_stable_for_equal_timestamps() {
        let existing = vec![at(10, 1.0), at(10, 2.0)];
        let merged = merge(existing, vec![at(10, 3.0), at(0, 0.0)]);
        let values: Vec<_> = merged.iter().map(|o| o.value.unwrap()).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let page = vec![at(1, 1.0), at(2, 2.0)];
        let merged = merge(page.clone(), page);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged[0], merged[1]);
    }

    #[test]
    fn test_merge_stays_sorted_over_many_pages() {
        let mut acc = Vec::new();
        for page in 0..5i64 {
            let incoming = (0..7).map(|i| at((i * 37 + page * 11) % 50, i as f64)).collect();
            acc = merge(acc, incoming);
            assert!(is_sorted(&acc));
        }
        assert_eq!(acc.len(), 35);
    }
}
