//! Timezone reprojection of civil timestamps.
//!
//! Timestamps in a batch are naive civil values; the zone they are expressed
//! in is batch metadata. Reprojection localizes each value in the source
//! zone, converts the absolute instant to the target zone and strips the zone
//! again, optionally forcing a daylight-saving or standard-time reading.

use chrono::{
    DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::{OffsetComponents, Tz};
use thiserror::Error;

use crate::record::ConversationRecord;
use crate::types::DstOverride;

/// How far back to look for the offset in force before a spring-forward gap.
const TRANSITION_PROBE_HOURS: i64 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimezoneError {
    #[error("unknown timezone: {0}")]
    UnknownZone(String),
}

/// UTC offsets of a catalogued zone, in minutes east of UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneOffsets {
    Fixed {
        utc_minutes: i32,
    },
    Seasonal {
        standard_minutes: i32,
        dst_minutes: i32,
    },
}

/// A zone the deployment reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownZone {
    pub id: &'static str,
    pub label: &'static str,
    pub offsets: ZoneOffsets,
}

const UTC8: ZoneOffsets = ZoneOffsets::Fixed { utc_minutes: 480 };

pub const KNOWN_ZONES: [KnownZone; 9] = [
    KnownZone {
        id: "UTC",
        label: "UTC (協調世界時)",
        offsets: ZoneOffsets::Fixed { utc_minutes: 0 },
    },
    KnownZone {
        id: "Asia/Taipei",
        label: "UTC+8 (台北時間)",
        offsets: UTC8,
    },
    KnownZone {
        id: "Asia/Shanghai",
        label: "UTC+8 (上海時間)",
        offsets: UTC8,
    },
    KnownZone {
        id: "Asia/Hong_Kong",
        label: "UTC+8 (香港時間)",
        offsets: UTC8,
    },
    KnownZone {
        id: "Asia/Singapore",
        label: "UTC+8 (新加坡時間)",
        offsets: UTC8,
    },
    KnownZone {
        id: "Asia/Tokyo",
        label: "UTC+9 (東京時間)",
        offsets: ZoneOffsets::Fixed { utc_minutes: 540 },
    },
    KnownZone {
        id: "Europe/London",
        label: "UTC+0/+1 (倫敦時間)",
        offsets: ZoneOffsets::Seasonal {
            standard_minutes: 0,
            dst_minutes: 60,
        },
    },
    KnownZone {
        id: "America/New_York",
        label: "UTC-5/-4 (紐約時間)",
        offsets: ZoneOffsets::Seasonal {
            standard_minutes: -300,
            dst_minutes: -240,
        },
    },
    KnownZone {
        id: "America/Los_Angeles",
        label: "UTC-8/-7 (洛杉磯時間)",
        offsets: ZoneOffsets::Seasonal {
            standard_minutes: -480,
            dst_minutes: -420,
        },
    },
];

/// Looks up a catalogued zone by IANA identifier.
pub fn known_zone(id: &str) -> Option<&'static KnownZone> {
    KNOWN_ZONES.iter().find(|zone| zone.id == id)
}

/// Resolves an IANA identifier.
pub fn resolve_zone(id: &str) -> Result<Tz, TimezoneError> {
    id.trim()
        .parse::<Tz>()
        .map_err(|_| TimezoneError::UnknownZone(id.to_string()))
}

/// Converts civil timestamps from one zone's clock to another's.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector {
    source: Tz,
    target: Tz,
    dst_override: DstOverride,
    dst_delta: TimeDelta,
}

impl Reprojector {
    /// Resolves both zones up front, so an unknown id fails the whole batch.
    pub fn new(
        source_id: &str,
        target_id: &str,
        dst_override: DstOverride,
    ) -> Result<Self, TimezoneError> {
        let source = resolve_zone(source_id)?;
        let target = resolve_zone(target_id)?;
        Ok(Self {
            source,
            target,
            dst_override,
            dst_delta: dst_delta(target),
        })
    }

    /// Re-expresses a source-zone civil time on the target zone's clock.
    pub fn convert(&self, civil: NaiveDateTime) -> NaiveDateTime {
        let instant = localize(self.source, civil);
        let local = instant.with_timezone(&self.target);
        let converted = local.naive_local();

        if !self.dst_override.is_forced() || self.dst_delta.is_zero() {
            return converted;
        }

        let is_dst = !local.offset().dst_offset().is_zero();
        let adjusted = match self.dst_override {
            DstOverride::ForceDst if !is_dst => converted.checked_add_signed(self.dst_delta),
            DstOverride::ForceStandard if is_dst => converted.checked_sub_signed(self.dst_delta),
            _ => None,
        };
        adjusted.unwrap_or(converted)
    }
}

/// Reprojects a batch into the target zone's civil clock.
///
/// Returns a new record set; unparseable timestamps stay unparseable. Fails
/// as a whole when either zone id is unknown, leaving the caller to fall back
/// to the unconverted batch.
pub fn reproject(
    records: &[ConversationRecord],
    source_id: &str,
    target_id: &str,
    dst_override: DstOverride,
) -> Result<Vec<ConversationRecord>, TimezoneError> {
    let reprojector = Reprojector::new(source_id, target_id, dst_override)?;
    Ok(records
        .iter()
        .map(|record| {
            record.with_timestamp(record.request_timestamp.map(|ts| reprojector.convert(ts)))
        })
        .collect())
}

/// Reprojects a bare time of day, anchored to `reference_date`.
///
/// Used for check-in/check-out times, which have to follow the data into the
/// target zone.
pub fn reproject_time_of_day(
    time: NaiveTime,
    reference_date: NaiveDate,
    source_id: &str,
    target_id: &str,
) -> Result<NaiveTime, TimezoneError> {
    let reprojector = Reprojector::new(source_id, target_id, DstOverride::Auto)?;
    Ok(reprojector.convert(reference_date.and_time(time)).time())
}

/// One-line daylight-saving status for a zone, e.g. `夏令時: UTC-04:00 (自動)`.
///
/// Zones that never observe DST have no status line.
pub fn describe_zone_status(
    zone_id: &str,
    dst_override: DstOverride,
    now: DateTime<Utc>,
) -> Result<Option<String>, TimezoneError> {
    let tz = resolve_zone(zone_id)?;
    if dst_delta(tz).is_zero() {
        return Ok(None);
    }

    let (is_dst, offset_seconds, mode) = match dst_override {
        DstOverride::Auto => {
            let local = now.with_timezone(&tz);
            (
                !local.offset().dst_offset().is_zero(),
                local.offset().fix().local_minus_utc(),
                "自動",
            )
        }
        DstOverride::ForceDst => (true, forced_offset_seconds(tz, true), "強制"),
        DstOverride::ForceStandard => (false, forced_offset_seconds(tz, false), "強制"),
    };

    let status = if is_dst { "夏令時" } else { "標準時間" };
    Ok(Some(format!(
        "{status}: UTC{} ({mode})",
        format_utc_offset(offset_seconds)
    )))
}

/// Formats seconds east of UTC as `+08:00` / `-04:00`.
pub fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

/// Localizes a civil time in `tz`.
///
/// Ambiguous fall-back times take the later (standard-time) reading.
/// Nonexistent spring-forward times are read with the offset that was in
/// force just before the transition.
fn localize(tz: Tz, civil: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&civil) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, later) => later.with_timezone(&Utc),
        LocalResult::None => {
            let before = civil - TimeDelta::hours(TRANSITION_PROBE_HOURS);
            let offset = tz.from_local_datetime(&before).earliest().map_or_else(
                || tz.offset_from_utc_datetime(&civil).fix(),
                |dt| dt.offset().fix(),
            );
            let utc = civil - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    }
}

/// Difference between a zone's daylight-saving and standard offsets.
///
/// Catalogued zones use their table entry; anything else is probed at a
/// northern summer and winter reference date.
fn dst_delta(tz: Tz) -> TimeDelta {
    match known_zone(tz.name()).map(|zone| zone.offsets) {
        Some(ZoneOffsets::Fixed { .. }) => TimeDelta::zero(),
        Some(ZoneOffsets::Seasonal {
            standard_minutes,
            dst_minutes,
        }) => TimeDelta::minutes(i64::from(dst_minutes - standard_minutes)),
        None => {
            let (winter, summer) = probe_offsets(tz);
            TimeDelta::seconds(i64::from((summer - winter).abs()))
        }
    }
}

fn forced_offset_seconds(tz: Tz, dst: bool) -> i32 {
    if let Some(ZoneOffsets::Seasonal {
        standard_minutes,
        dst_minutes,
    }) = known_zone(tz.name()).map(|zone| zone.offsets)
    {
        let minutes = if dst { dst_minutes } else { standard_minutes };
        return minutes * 60;
    }
    let (winter, summer) = probe_offsets(tz);
    if dst {
        winter.max(summer)
    } else {
        winter.min(summer)
    }
}

/// Offsets (seconds east of UTC) on 2024-01-15 and 2024-07-15 at noon.
fn probe_offsets(tz: Tz) -> (i32, i32) {
    let offset_on = |month: u32| {
        NaiveDate::from_ymd_opt(2024, month, 15)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .map_or(0, |noon| {
                tz.offset_from_utc_datetime(&noon).fix().local_minus_utc()
            })
    };
    (offset_on(1), offset_on(7))
}
