//! Stay-session segmentation.
//!
//! Conversations are partitioned by `(hotel, room)`, ordered by timestamp and
//! walked through a small state machine that opens a stay window at the
//! nominal check-in time and closes it at the nominal checkout.
//!
//! # Window rule
//!
//! For a timestamp `t` with time of day `ct`:
//!
//! 1. `ct >= checkin`: the stay started today.
//! 2. `ct` in the gap `[checkout, checkin)` and the gap policy is not
//!    [`GapPolicy::SeparateGapSession`]: the record is attributed to the stay
//!    that starts at today's check-in.
//! 3. Otherwise the stay started yesterday.
//!
//! The window ends at checkout on the following day when
//! `checkout <= checkin` (the usual overnight stay), or on the same day
//! otherwise. The gap window is half-open, so a record logged exactly at
//! checkout already belongs to the gap.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use thiserror::Error;

use crate::record::ConversationRecord;
use crate::types::GapPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// Check-in and checkout at the same time of day leave no gap and no
    /// meaningful stay boundary.
    #[error("check-in and checkout are both {0}")]
    IdenticalCheckTimes(NaiveTime),

    #[error("session window is empty: {start} is not before {end}")]
    EmptyWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("date out of range next to {0}")]
    DateOutOfRange(NaiveDate),
}

/// Nominal check-in/checkout times and the gap-period policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInOut {
    checkin: NaiveTime,
    checkout: NaiveTime,
    gap_policy: GapPolicy,
}

impl CheckInOut {
    pub fn new(
        checkin: NaiveTime,
        checkout: NaiveTime,
        gap_policy: GapPolicy,
    ) -> Result<Self, SegmentError> {
        if checkin == checkout {
            return Err(SegmentError::IdenticalCheckTimes(checkin));
        }
        Ok(Self {
            checkin,
            checkout,
            gap_policy,
        })
    }

    pub const fn checkin(&self) -> NaiveTime {
        self.checkin
    }

    pub const fn checkout(&self) -> NaiveTime {
        self.checkout
    }

    pub const fn gap_policy(&self) -> GapPolicy {
        self.gap_policy
    }

    /// Whether `time` falls in `[checkout, checkin)`.
    ///
    /// Only an overnight configuration (`checkout < checkin`) has a gap.
    pub fn is_in_gap(&self, time: NaiveTime) -> bool {
        self.checkout < self.checkin && self.checkout <= time && time < self.checkin
    }

    /// The stay window a timestamp is attributed to.
    pub fn stay_window(&self, ts: NaiveDateTime) -> Result<SessionKey, SegmentError> {
        let time = ts.time();
        let date = ts.date();

        // Gap arrivals belong to the stay starting at today's check-in,
        // unless gap traffic gets its own session.
        let starts_today = time >= self.checkin
            || (self.is_in_gap(time) && self.gap_policy != GapPolicy::SeparateGapSession);

        let start_date = if starts_today {
            date
        } else {
            date.pred_opt().ok_or(SegmentError::DateOutOfRange(date))?
        };

        let end_date = if self.checkout <= self.checkin {
            start_date
                .succ_opt()
                .ok_or(SegmentError::DateOutOfRange(start_date))?
        } else {
            start_date
        };

        SessionKey::new(
            start_date.and_time(self.checkin),
            end_date.and_time(self.checkout),
            false,
        )
    }

    /// The gap window on `date`: checkout to check-in of the same day.
    pub fn gap_window(&self, date: NaiveDate) -> Result<SessionKey, SegmentError> {
        SessionKey::new(date.and_time(self.checkout), date.and_time(self.checkin), true)
    }
}

/// Identity of a session: its half-open window and whether it is a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_gap_period: bool,
}

impl SessionKey {
    fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        is_gap_period: bool,
    ) -> Result<Self, SegmentError> {
        if start >= end {
            return Err(SegmentError::EmptyWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            is_gap_period,
        })
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Conversations attributed to one occupancy (or one gap) of a room.
#[derive(Debug, Clone, PartialEq)]
pub struct StaySession {
    pub hotel: String,
    pub room: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_gap_period: bool,
    /// Chronological.
    pub conversations: Vec<ConversationRecord>,
    /// Boundaries as printed in the report. Equal to `start`/`end` unless the
    /// export re-expressed them on the hotel's local clock.
    pub display_start: NaiveDateTime,
    pub display_end: NaiveDateTime,
}

impl StaySession {
    pub const fn key(&self) -> SessionKey {
        SessionKey {
            start: self.start,
            end: self.end,
            is_gap_period: self.is_gap_period,
        }
    }

    #[must_use]
    pub fn with_display_window(self, display_start: NaiveDateTime, display_end: NaiveDateTime) -> Self {
        Self {
            display_start,
            display_end,
            ..self
        }
    }
}

/// Result of segmenting a batch.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Sorted by `(start, room)`.
    pub sessions: Vec<StaySession>,
    /// Records skipped because their timestamp could not be parsed.
    pub unparseable: usize,
    /// Gap records dropped under [`GapPolicy::Exclude`].
    pub excluded_gap: usize,
}

/// Accumulates conversations for one session key.
#[derive(Debug)]
struct SessionBuilder {
    key: SessionKey,
    conversations: Vec<ConversationRecord>,
}

impl SessionBuilder {
    const fn new(key: SessionKey) -> Self {
        Self {
            key,
            conversations: Vec::new(),
        }
    }

    fn finish(self, hotel: &str, room: &str) -> StaySession {
        StaySession {
            hotel: hotel.to_string(),
            room: room.to_string(),
            start: self.key.start,
            end: self.key.end,
            is_gap_period: self.key.is_gap_period,
            conversations: self.conversations,
            display_start: self.key.start,
            display_end: self.key.end,
        }
    }
}

struct PartitionOutcome {
    sessions: Vec<StaySession>,
    excluded_gap: usize,
}

/// Segments a batch into stay sessions.
///
/// Records without a parseable timestamp never join a session. Partitions
/// are independent and run on the rayon pool; the final order is by
/// `(start, room)` regardless of scheduling.
pub fn segment(
    records: Vec<ConversationRecord>,
    schedule: &CheckInOut,
) -> Result<Segmentation, SegmentError> {
    let mut unparseable = 0;
    let mut partitions: BTreeMap<(String, String), Vec<(NaiveDateTime, ConversationRecord)>> =
        BTreeMap::new();

    for record in records {
        let Some(ts) = record.request_timestamp else {
            tracing::debug!(
                conversation_id = %record.conversation_id,
                raw = %record.raw_timestamp,
                "skipping record without a parseable timestamp"
            );
            unparseable += 1;
            continue;
        };
        let (hotel, room) = record.partition_key();
        partitions
            .entry((hotel.to_string(), room.to_string()))
            .or_default()
            .push((ts, record));
    }

    let outcomes = partitions
        .into_par_iter()
        .map(|((hotel, room), mut rows)| {
            rows.sort_by_key(|(ts, _)| *ts);
            segment_partition(&hotel, &room, rows, schedule)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut sessions = Vec::new();
    let mut excluded_gap = 0;
    for outcome in outcomes {
        excluded_gap += outcome.excluded_gap;
        sessions.extend(outcome.sessions);
    }
    sessions.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.room.cmp(&b.room)));

    tracing::debug!(
        sessions = sessions.len(),
        unparseable,
        excluded_gap,
        policy = %schedule.gap_policy(),
        "segmented batch"
    );

    Ok(Segmentation {
        sessions,
        unparseable,
        excluded_gap,
    })
}

/// Runs the state machine over one room's time-ordered records.
fn segment_partition(
    hotel: &str,
    room: &str,
    rows: Vec<(NaiveDateTime, ConversationRecord)>,
    schedule: &CheckInOut,
) -> Result<PartitionOutcome, SegmentError> {
    let mut closed = Vec::new();
    let mut open: Option<SessionBuilder> = None;
    // Gap sessions interleave with stays in time, so they are matched by key.
    let mut gap_sessions: BTreeMap<SessionKey, SessionBuilder> = BTreeMap::new();
    let mut excluded_gap = 0;

    for (ts, record) in rows {
        if schedule.is_in_gap(ts.time()) {
            match schedule.gap_policy() {
                GapPolicy::Exclude => {
                    excluded_gap += 1;
                    continue;
                }
                GapPolicy::SeparateGapSession => {
                    let key = schedule.gap_window(ts.date())?;
                    gap_sessions
                        .entry(key)
                        .or_insert_with(|| SessionBuilder::new(key))
                        .conversations
                        .push(record);
                    continue;
                }
                GapPolicy::MergeIntoNext => {}
            }
        }

        let key = schedule.stay_window(ts)?;
        if let Some(current) = open.as_mut().filter(|current| current.key == key) {
            current.conversations.push(record);
            continue;
        }

        let mut next = SessionBuilder::new(key);
        next.conversations.push(record);
        if let Some(done) = open.replace(next) {
            closed.push(done.finish(hotel, room));
        }
    }

    if let Some(done) = open {
        closed.push(done.finish(hotel, room));
    }
    closed.extend(
        gap_sessions
            .into_values()
            .map(|builder| builder.finish(hotel, room)),
    );
    closed.sort_by_key(StaySession::key);

    Ok(PartitionOutcome {
        sessions: closed,
        excluded_gap,
    })
}
