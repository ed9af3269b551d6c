//! Time-range and latency filtering applied before export.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::ConversationRecord;

/// Optional bounds on request date and response latency.
///
/// Date bounds are inclusive whole days. A record lacking the attribute a
/// bound refers to (no parseable timestamp, no latency) is dropped by that
/// bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_latency: Option<f64>,
    pub max_latency: Option<f64>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.min_latency.is_none()
            && self.max_latency.is_none()
    }

    pub fn matches(&self, record: &ConversationRecord) -> bool {
        self.matches_date(record) && self.matches_latency(record)
    }

    fn matches_date(&self, record: &ConversationRecord) -> bool {
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        let Some(ts) = record.request_timestamp else {
            return false;
        };
        let after_start = self
            .start_date
            .and_then(|start| start.and_hms_opt(0, 0, 0))
            .is_none_or(|start| ts >= start);
        // Compare against the next midnight so the end day is included.
        let before_end = self
            .end_date
            .and_then(|end| end.checked_add_days(Days::new(1)))
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .is_none_or(|next| ts < next);
        after_start && before_end
    }

    fn matches_latency(&self, record: &ConversationRecord) -> bool {
        if self.min_latency.is_none() && self.max_latency.is_none() {
            return true;
        }
        let Some(latency) = record.response_timecost else {
            return false;
        };
        self.min_latency.is_none_or(|min| latency >= min)
            && self.max_latency.is_none_or(|max| latency <= max)
    }

    /// Keeps the records that pass every bound, in their original order.
    pub fn apply(&self, records: Vec<ConversationRecord>) -> Vec<ConversationRecord> {
        if self.is_empty() {
            return records;
        }
        let before = records.len();
        let kept: Vec<_> = records.into_iter().filter(|r| self.matches(r)).collect();
        tracing::debug!(before, after = kept.len(), "applied record filter");
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn rec(ts: &str, latency: Option<f64>) -> ConversationRecord {
        RawRecord {
            request_timestamp: Some(ts.to_string()),
            response_timecost: latency,
            ..RawRecord::default()
        }
        .into_record()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let records = vec![rec("garbage", None), rec("2024-01-10 10:00:00", Some(1.0))];
        let kept = RecordFilter::default().apply(records.clone());
        assert_eq!(kept, records);
    }

    #[test]
    fn test_date_bounds_are_inclusive_days() {
        let filter = RecordFilter {
            start_date: Some(day("2024-01-10")),
            end_date: Some(day("2024-01-11")),
            ..RecordFilter::default()
        };

        assert!(!filter.matches(&rec("2024-01-09 23:59:59", None)));
        assert!(filter.matches(&rec("2024-01-10 00:00:00", None)));
        assert!(filter.matches(&rec("2024-01-11 23:59:59", None)));
        assert!(!filter.matches(&rec("2024-01-12 00:00:00", None)));
        assert!(!filter.matches(&rec("not a date", None)));
    }

    #[test]
    fn test_latency_bounds_drop_missing_latency() {
        let filter = RecordFilter {
            min_latency: Some(2.0),
            max_latency: Some(5.0),
            ..RecordFilter::default()
        };

        assert!(filter.matches(&rec("2024-01-10 10:00:00", Some(2.0))));
        assert!(filter.matches(&rec("2024-01-10 10:00:00", Some(5.0))));
        assert!(!filter.matches(&rec("2024-01-10 10:00:00", Some(1.99))));
        assert!(!filter.matches(&rec("2024-01-10 10:00:00", Some(8.0))));
        assert!(!filter.matches(&rec("2024-01-10 10:00:00", None)));
    }

    #[test]
    fn test_apply_preserves_order() {
        let filter = RecordFilter {
            min_latency: Some(1.0),
            ..RecordFilter::default()
        };
        let kept = filter.apply(vec![
            rec("2024-01-10 12:00:00", Some(3.0)),
            rec("2024-01-10 09:00:00", Some(0.5)),
            rec("2024-01-10 08:00:00", Some(1.5)),
        ]);
        let latencies: Vec<_> = kept.iter().filter_map(|r| r.response_timecost).collect();
        assert_eq!(latencies, [3.0, 1.5]);
    }
}
