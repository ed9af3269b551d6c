//! Core domain logic for smart-speaker stay reports.
//!
//! This crate contains the fundamental types and logic for:
//! - Timestamp normalization: reducing mixed encodings to civil datetimes
//! - Timezone reprojection: moving a batch between zone clocks with DST overrides
//! - Stay segmentation: grouping a room's conversations into check-in/checkout windows
//! - Report rendering: the plain-text export, including alarm annotations

pub mod alarm;
pub mod export;
pub mod filter;
pub mod record;
pub mod report;
pub mod segment;
pub mod summary;
pub mod timestamp;
pub mod timezone;
pub mod types;

pub use alarm::{AlarmEntity, AlarmExtraction, extract_alarm};
pub use export::{ExportError, ExportOptions, ExportedReport, export_report, report_filename};
pub use filter::RecordFilter;
pub use record::{BatchError, ConversationRecord, MAX_BATCH_RECORDS, RawRecord, normalize_batch};
pub use report::{format_report, timezone_label};
pub use segment::{CheckInOut, SegmentError, Segmentation, SessionKey, StaySession, segment};
pub use summary::{BatchSummary, RiskCount, RiskLevel};
pub use timestamp::normalize_timestamp;
pub use timezone::{
    KNOWN_ZONES, KnownZone, Reprojector, TimezoneError, ZoneOffsets, describe_zone_status,
    known_zone, reproject, reproject_time_of_day, resolve_zone,
};
pub use types::{DstOverride, GapPolicy, ValidationError, parse_time_of_day};
