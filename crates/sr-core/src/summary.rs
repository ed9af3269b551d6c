//! Batch overview: counts, time span and latency risk distribution.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::record::ConversationRecord;

/// Latency bucket for a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Under 3 seconds.
    Safe,
    /// 3 to 5 seconds.
    Low,
    /// 5 to 8 seconds.
    Medium,
    /// 8 seconds or more.
    High,
    /// No latency recorded.
    Unknown,
}

impl RiskLevel {
    pub const ALL: [Self; 5] = [Self::Safe, Self::Low, Self::Medium, Self::High, Self::Unknown];

    pub fn from_latency(latency: Option<f64>) -> Self {
        match latency {
            None => Self::Unknown,
            Some(secs) if secs < 3.0 => Self::Safe,
            Some(secs) if secs < 5.0 => Self::Low,
            Some(secs) if secs < 8.0 => Self::Medium,
            Some(_) => Self::High,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Safe => "安全 (<3s)",
            Self::Low => "低風險 (3-5s)",
            Self::Medium => "中風險 (5-8s)",
            Self::High => "高風險 (>8s)",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Count of records in one risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskCount {
    pub level: RiskLevel,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub unparseable: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub min_latency: Option<f64>,
    pub max_latency: Option<f64>,
    /// Every level, in bucket order, including empty ones.
    pub risk: Vec<RiskCount>,
    pub hotels: Vec<String>,
    /// Distinct `(hotel, room)` pairs.
    pub room_count: usize,
}

impl BatchSummary {
    pub fn from_records(records: &[ConversationRecord]) -> Self {
        let mut hotels = BTreeSet::new();
        let mut rooms = BTreeSet::new();
        let mut risk = RiskLevel::ALL.map(|level| RiskCount { level, count: 0 });
        let mut unparseable = 0;
        let mut first_timestamp: Option<NaiveDateTime> = None;
        let mut last_timestamp: Option<NaiveDateTime> = None;
        let mut min_latency: Option<f64> = None;
        let mut max_latency: Option<f64> = None;

        for record in records {
            hotels.insert(record.hotel_name.as_str());
            rooms.insert(record.partition_key());

            match record.request_timestamp {
                Some(ts) => {
                    first_timestamp = Some(first_timestamp.map_or(ts, |t| t.min(ts)));
                    last_timestamp = Some(last_timestamp.map_or(ts, |t| t.max(ts)));
                }
                None => unparseable += 1,
            }

            if let Some(latency) = record.response_timecost {
                min_latency = Some(min_latency.map_or(latency, |m| m.min(latency)));
                max_latency = Some(max_latency.map_or(latency, |m| m.max(latency)));
            }

            let level = RiskLevel::from_latency(record.response_timecost);
            if let Some(bucket) = risk.iter_mut().find(|bucket| bucket.level == level) {
                bucket.count += 1;
            }
        }

        Self {
            total: records.len(),
            unparseable,
            first_timestamp,
            last_timestamp,
            min_latency,
            max_latency,
            risk: risk.to_vec(),
            hotels: hotels.into_iter().map(str::to_string).collect(),
            room_count: rooms.len(),
        }
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        self.risk
            .iter()
            .find(|bucket| bucket.level == level)
            .map_or(0, |bucket| bucket.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn rec(hotel: &str, room: &str, ts: &str, latency: Option<f64>) -> ConversationRecord {
        RawRecord {
            hotel_name: Some(hotel.to_string()),
            room_name: Some(room.to_string()),
            request_timestamp: Some(ts.to_string()),
            response_timecost: latency,
            ..RawRecord::default()
        }
        .into_record()
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(RiskLevel::from_latency(Some(0.0)), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_latency(Some(2.99)), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_latency(Some(3.0)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_latency(Some(5.0)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_latency(Some(7.99)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_latency(Some(8.0)), RiskLevel::High);
        assert_eq!(RiskLevel::from_latency(None), RiskLevel::Unknown);
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            rec("Grand", "101", "2024-01-10 15:00:00", Some(1.0)),
            rec("Grand", "102", "2024-01-09 09:00:00", Some(9.5)),
            rec("Harbor", "101", "garbage", None),
            rec("Grand", "101", "2024-01-11 10:00:00", Some(4.0)),
        ];
        let summary = BatchSummary::from_records(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.unparseable, 1);
        assert_eq!(
            summary.first_timestamp.unwrap().to_string(),
            "2024-01-09 09:00:00"
        );
        assert_eq!(
            summary.last_timestamp.unwrap().to_string(),
            "2024-01-11 10:00:00"
        );
        assert_eq!(summary.min_latency, Some(1.0));
        assert_eq!(summary.max_latency, Some(9.5));
        assert_eq!(summary.count(RiskLevel::Safe), 1);
        assert_eq!(summary.count(RiskLevel::Low), 1);
        assert_eq!(summary.count(RiskLevel::Medium), 0);
        assert_eq!(summary.count(RiskLevel::High), 1);
        assert_eq!(summary.count(RiskLevel::Unknown), 1);
        assert_eq!(summary.hotels, ["Grand", "Harbor"]);
        assert_eq!(summary.room_count, 3);
    }

    #[test]
    fn test_empty_batch() {
        let summary = BatchSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.first_timestamp, None);
        assert_eq!(summary.risk.len(), RiskLevel::ALL.len());
        assert!(summary.risk.iter().all(|bucket| bucket.count == 0));
    }

    #[test]
    fn test_summary_serializes_snake_case_levels() {
        let summary = BatchSummary::from_records(&[rec("Grand", "101", "2024-01-10 15:00:00", None)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["risk"][4]["level"], "unknown");
        assert_eq!(json["risk"][4]["count"], 1);
        assert_eq!(json["first_timestamp"], "2024-01-10T15:00:00");
    }
}
