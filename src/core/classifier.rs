use crate::domain::model::{Bucket, ClassificationEvent, EdgePolicy, Record, TimeRange};
use chrono::{NaiveDateTime, TimeDelta};

pub const DEFAULT_TOLERANCE_MS: u64 = 150;

/// Decides which intervals a record belongs to and with which timestamp it
/// is written there.
///
/// A record is considered for an interval only when it lies strictly inside
/// `(start - tolerance, end + tolerance)`. Three independent checks then run:
///
/// * start edge: the record is on `start`; emitted at `start`
/// * interior: `start < t < end`; emitted at the record's own time
/// * end edge: the record is on `end`; emitted at `end`
///
/// With [`EdgePolicy::Band`] the edge checks also accept records between the
/// tolerance boundary and the edge, snapping them onto the edge.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryClassifier {
    tolerance: TimeDelta,
    policy: EdgePolicy,
}

impl Default for BoundaryClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_MS, EdgePolicy::Exact)
    }
}

impl BoundaryClassifier {
    pub fn new(tolerance_ms: u64, policy: EdgePolicy) -> Self {
        let tolerance = i64::try_from(tolerance_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX);
        Self { tolerance, policy }
    }

    /// Lazily yields one event per (interval, bucket) match. Holds no state, so
    /// classifying the same record twice gives the same events.
    pub fn classify<'a, I>(
        &'a self,
        record: Record,
        intervals: I,
    ) -> impl Iterator<Item = ClassificationEvent> + 'a
    where
        I: IntoIterator<Item = &'a TimeRange>,
        I::IntoIter: 'a,
    {
        intervals.into_iter().flat_map(move |range| {
            self.matches(record.timestamp, range)
                .into_iter()
                .flatten()
                .map(move |(bucket, emitted_timestamp)| ClassificationEvent {
                    interval_id: range.id.clone(),
                    bucket,
                    emitted_timestamp,
                    frequency: record.frequency,
                    power: record.power,
                })
        })
    }

    fn matches(
        &self,
        timestamp: NaiveDateTime,
        range: &TimeRange,
    ) -> [Option<(Bucket, NaiveDateTime)>; 3] {
        let mut found = [None; 3];
        if !self.is_near(timestamp, range) {
            return found;
        }

        if self.on_start_edge(timestamp, range) {
            found[0] = Some((Bucket::StartEdge, range.start));
        }
        if range.start < timestamp && timestamp < range.end {
            found[1] = Some((Bucket::Interior, timestamp));
        }
        if self.on_end_edge(timestamp, range) {
            found[2] = Some((Bucket::EndEdge, range.end));
        }
        found
    }

    fn is_near(&self, timestamp: NaiveDateTime, range: &TimeRange) -> bool {
        let lower = range
            .start
            .checked_sub_signed(self.tolerance)
            .unwrap_or(NaiveDateTime::MIN);
        let upper = range
            .end
            .checked_add_signed(self.tolerance)
            .unwrap_or(NaiveDateTime::MAX);
        lower < timestamp && timestamp < upper
    }

    // Only reached for near records, where "before start - tolerance" can
    // never hold; Exact therefore reduces to equality.
    fn on_start_edge(&self, timestamp: NaiveDateTime, range: &TimeRange) -> bool {
        match self.policy {
            EdgePolicy::Exact => timestamp == range.start,
            EdgePolicy::Band => timestamp <= range.start,
        }
    }

    fn on_end_edge(&self, timestamp: NaiveDateTime, range: &TimeRange) -> bool {
        match self.policy {
            EdgePolicy::Exact => timestamp == range.end,
            EdgePolicy::Band => timestamp >= range.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, ms)
            .unwrap()
    }

    fn range(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> TimeRange {
        TimeRange {
            id: id.to_string(),
            start,
            end,
        }
    }

    fn record(timestamp: NaiveDateTime) -> Record {
        Record {
            timestamp,
            frequency: 50.0123,
            power: 7.5,
        }
    }

    fn interval_a() -> TimeRange {
        range("A", at(10, 0, 0, 0), at(10, 5, 0, 0))
    }

    fn classify(classifier: &BoundaryClassifier, ts: NaiveDateTime) -> Vec<ClassificationEvent> {
        let ranges = [interval_a()];
        classifier.classify(record(ts), ranges.iter()).collect()
    }

    #[test]
    fn test_record_on_start_snaps_to_start() {
        let events = classify(&BoundaryClassifier::default(), at(10, 0, 0, 0));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].bucket, Bucket::StartEdge);
        assert_eq!(events[0].emitted_timestamp, at(10, 0, 0, 0));
        assert_eq!(events[0].interval_id, "A");
    }

    #[test]
    fn test_record_on_end_snaps_to_end() {
        let events = classify(&BoundaryClassifier::default(), at(10, 5, 0, 0));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].bucket, Bucket::EndEdge);
        assert_eq!(events[0].emitted_timestamp, at(10, 5, 0, 0));
    }

    #[test]
    fn test_interior_record_keeps_its_timestamp() {
        let classifier = BoundaryClassifier::default();
        for ts in [at(10, 0, 0, 10), at(10, 2, 30, 0), at(10, 4, 59, 990)] {
            let events = classify(&classifier, ts);
            assert_eq!(events.len(), 1, "record at {ts}");
            assert_eq!(events[0].bucket, Bucket::Interior);
            assert_eq!(events[0].emitted_timestamp, ts);
            assert_eq!(events[0].frequency, 50.0123);
            assert_eq!(events[0].power, 7.5);
        }
    }

    #[test]
    fn test_records_outside_tolerance_produce_nothing() {
        let classifier = BoundaryClassifier::default();
        for ts in [
            at(9, 59, 59, 850),
            at(9, 59, 0, 0),
            at(10, 5, 0, 150),
            at(11, 0, 0, 0),
        ] {
            assert!(classify(&classifier, ts).is_empty(), "record at {ts}");
        }
    }

    #[test]
    fn test_exact_policy_ignores_records_inside_band_but_outside_interval() {
        let classifier = BoundaryClassifier::default();
        assert!(classify(&classifier, at(9, 59, 59, 900)).is_empty());
        assert!(classify(&classifier, at(10, 5, 0, 100)).is_empty());
    }

    #[test]
    fn test_band_policy_snaps_records_inside_band() {
        let classifier = BoundaryClassifier::new(150, EdgePolicy::Band);

        let early = classify(&classifier, at(9, 59, 59, 900));
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].bucket, Bucket::StartEdge);
        assert_eq!(early[0].emitted_timestamp, at(10, 0, 0, 0));

        let late = classify(&classifier, at(10, 5, 0, 100));
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].bucket, Bucket::EndEdge);
        assert_eq!(late[0].emitted_timestamp, at(10, 5, 0, 0));

        assert!(classify(&classifier, at(9, 59, 59, 850)).is_empty());
        assert_eq!(classify(&classifier, at(10, 2, 0, 0))[0].bucket, Bucket::Interior);
    }

    #[test]
    fn test_record_fans_out_to_every_matching_interval() {
        let ranges = [
            range("A", at(10, 0, 0, 0), at(10, 5, 0, 0)),
            range("B", at(10, 5, 0, 0), at(10, 10, 0, 0)),
            range("C", at(10, 3, 0, 0), at(10, 8, 0, 0)),
            range("D", at(12, 0, 0, 0), at(12, 5, 0, 0)),
        ];
        let classifier = BoundaryClassifier::default();
        let events: Vec<_> = classifier
            .classify(record(at(10, 5, 0, 0)), ranges.iter())
            .collect();

        let tags: Vec<_> = events
            .iter()
            .map(|e| (e.interval_id.as_str(), e.bucket))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("A", Bucket::EndEdge),
                ("B", Bucket::StartEdge),
                ("C", Bucket::Interior),
            ]
        );
    }

    #[test]
    fn test_classification_is_repeatable() {
        let ranges = [
            interval_a(),
            range("B", at(10, 4, 0, 0), at(10, 6, 0, 0)),
        ];
        let classifier = BoundaryClassifier::default();
        let rec = record(at(10, 4, 30, 0));

        let first: Vec<_> = classifier.classify(rec, ranges.iter()).collect();
        let second: Vec<_> = classifier.classify(rec, ranges.iter()).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_intervals_no_events() {
        let classifier = BoundaryClassifier::default();
        let none: [TimeRange; 0] = [];
        assert_eq!(classifier.classify(record(at(10, 0, 0, 0)), none.iter()).count(), 0);
    }

    #[test]
    fn test_zero_tolerance_excludes_edges() {
        let classifier = BoundaryClassifier::new(0, EdgePolicy::Exact);
        // with no band the open bounds exclude the edges themselves
        assert!(classify(&classifier, at(10, 0, 0, 0)).is_empty());
        assert_eq!(classify(&classifier, at(10, 1, 0, 0)).len(), 1);
    }
}
