//! End-to-end report export.
//!
//! The batch arrives on the hotel's local clock (the source zone), and the
//! nominal check-in/checkout times are hotel times. Segmentation therefore
//! runs on the source clock. When a different target zone is requested the
//! finished sessions are moved onto the target clock: conversations print in
//! the target zone, while stay boundaries keep reading in hotel time.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::record::ConversationRecord;
use crate::report::format_report;
use crate::segment::{CheckInOut, SegmentError, StaySession, segment};
use crate::timezone::{Reprojector, TimezoneError};
use crate::types::{DstOverride, GapPolicy};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Timezone(#[from] TimezoneError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Zone the batch timestamps and check times are expressed in.
    pub source_timezone: String,
    /// Zone the report is rendered in.
    pub target_timezone: String,
    pub dst_override: DstOverride,
    pub checkin: NaiveTime,
    pub checkout: NaiveTime,
    pub gap_policy: GapPolicy,
    pub export_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub content: String,
    pub filename: String,
    pub session_count: usize,
    pub unparseable: usize,
    pub excluded_gap: usize,
    /// Set when reprojection failed and the report uses the source zone.
    pub timezone_fallback: bool,
}

/// Runs the whole export: segment, reproject, format.
pub fn export_report(
    records: &[ConversationRecord],
    options: &ExportOptions,
) -> Result<ExportedReport, ExportError> {
    let filename = report_filename(records, options.export_date);
    let source = options.source_timezone.as_str();
    let target = options.target_timezone.as_str();

    let schedule = CheckInOut::new(options.checkin, options.checkout, options.gap_policy)?;

    let mut timezone_fallback = false;
    let reprojector = if source == target {
        None
    } else {
        match Reprojector::new(source, target, options.dst_override) {
            Ok(reprojector) => Some(reprojector),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source,
                    target,
                    "reprojection failed, exporting unconverted timestamps"
                );
                timezone_fallback = true;
                None
            }
        }
    };

    let segmentation = segment(records.to_vec(), &schedule)?;
    let (sessions, label_zone) = match reprojector {
        Some(reprojector) => {
            let sessions: Vec<_> = segmentation
                .sessions
                .into_iter()
                .map(|session| onto_target_clock(session, &reprojector))
                .collect();
            (sessions, target)
        }
        None => (segmentation.sessions, source),
    };

    let content = format_report(&sessions, options.export_date, Some(label_zone));
    tracing::info!(
        sessions = sessions.len(),
        unparseable = segmentation.unparseable,
        excluded_gap = segmentation.excluded_gap,
        %filename,
        "exported report"
    );

    Ok(ExportedReport {
        content,
        filename,
        session_count: sessions.len(),
        unparseable: segmentation.unparseable,
        excluded_gap: segmentation.excluded_gap,
        timezone_fallback,
    })
}

/// Re-expresses a hotel-clock session on the target clock, keeping the
/// hotel-local boundaries for display.
fn onto_target_clock(session: StaySession, reprojector: &Reprojector) -> StaySession {
    let (hotel_start, hotel_end) = (session.start, session.end);
    let conversations = session
        .conversations
        .iter()
        .map(|c| c.with_timestamp(c.request_timestamp.map(|ts| reprojector.convert(ts))))
        .collect();
    StaySession {
        start: reprojector.convert(hotel_start),
        end: reprojector.convert(hotel_end),
        conversations,
        ..session
    }
    .with_display_window(hotel_start, hotel_end)
}

/// `{hotel}_report_{date}.txt` for a single-hotel batch, otherwise
/// `combined_report_{date}.txt`.
pub fn report_filename(records: &[ConversationRecord], export_date: NaiveDate) -> String {
    let hotels: BTreeSet<&str> = records.iter().map(|r| r.hotel_name.as_str()).collect();
    let date = export_date.format("%Y-%m-%d");
    match hotels.iter().next() {
        Some(hotel) if hotels.len() == 1 => {
            format!("{}_report_{date}.txt", hotel.replace(['/', '\\'], "_"))
        }
        _ => format!("combined_report_{date}.txt"),
    }
}
