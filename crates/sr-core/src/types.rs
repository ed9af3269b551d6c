//! Validated configuration enums shared across the pipeline.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for user-supplied configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Unknown DST override mode.
    #[error("invalid DST override: {value} (expected auto, force_dst or force_standard)")]
    InvalidDstOverride { value: String },

    /// Unknown gap-period policy.
    #[error(
        "invalid gap policy: {value} (expected merge_into_next, separate_gap_session or exclude)"
    )]
    InvalidGapPolicy { value: String },

    /// A time of day that is not `HH:MM` or `HH:MM:SS`.
    #[error("invalid time of day: {value} (expected HH:MM)")]
    InvalidTimeOfDay { value: String },
}

/// How a forced daylight-saving reading is applied during reprojection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstOverride {
    /// Use whatever offset the zone's calendar rules give.
    #[default]
    Auto,
    /// Render every instant as if daylight-saving time were in effect.
    ForceDst,
    /// Render every instant as if standard time were in effect.
    ForceStandard,
}

impl DstOverride {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::ForceDst => "force_dst",
            Self::ForceStandard => "force_standard",
        }
    }

    /// Whether this mode overrides the calendar rule.
    #[must_use]
    pub const fn is_forced(&self) -> bool {
        !matches!(self, Self::Auto)
    }
}

impl fmt::Display for DstOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DstOverride {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Self::Auto),
            "force_dst" => Ok(Self::ForceDst),
            "force_standard" => Ok(Self::ForceStandard),
            other => Err(ValidationError::InvalidDstOverride {
                value: other.to_string(),
            }),
        }
    }
}

/// What happens to conversations logged between checkout and the next check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Fold gap traffic into the stay that starts at the next check-in.
    #[default]
    MergeIntoNext,
    /// Collect gap traffic into its own gap-period session.
    SeparateGapSession,
    /// Drop gap traffic before sessions are built.
    Exclude,
}

impl GapPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MergeIntoNext => "merge_into_next",
            Self::SeparateGapSession => "separate_gap_session",
            Self::Exclude => "exclude",
        }
    }
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GapPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "merge_into_next" => Ok(Self::MergeIntoNext),
            "separate_gap_session" => Ok(Self::SeparateGapSession),
            "exclude" => Ok(Self::Exclude),
            other => Err(ValidationError::InvalidGapPolicy {
                value: other.to_string(),
            }),
        }
    }
}

/// Parses a wall-clock time such as `14:00` or `14:00:30`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimeOfDay {
            value: value.to_string(),
        })
}
