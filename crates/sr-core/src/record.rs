//! Conversation records as consumed by the pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::timestamp::normalize_timestamp;

/// Largest batch accepted in one run.
pub const MAX_BATCH_RECORDS: usize = 100_000;

/// Placeholder for categorical fields the upstream row left blank.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch too large: {count} records (limit is {MAX_BATCH_RECORDS}); split the upload")]
    TooLarge { count: usize },
}

/// One logged interaction between a guest and the speaker.
///
/// Records are never edited in place: reprojection builds a new record via
/// [`ConversationRecord::with_timestamp`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRecord {
    pub hotel_name: String,
    pub room_name: String,
    pub conversation_id: String,
    /// Civil request time; `None` marks a timestamp that could not be parsed.
    pub request_timestamp: Option<NaiveDateTime>,
    /// The timestamp text exactly as received.
    pub raw_timestamp: String,
    pub user_query: String,
    pub chatbot_response: String,
    /// Response latency in seconds.
    pub response_timecost: Option<f64>,
    pub user_intent: String,
    /// Opaque structured payload, only read for alarm entities.
    pub raw_payload: serde_json::Value,
}

impl ConversationRecord {
    /// Returns a copy of this record carrying a different timestamp.
    #[must_use]
    pub fn with_timestamp(&self, request_timestamp: Option<NaiveDateTime>) -> Self {
        Self {
            request_timestamp,
            ..self.clone()
        }
    }

    /// The `(hotel, room)` partition this record belongs to.
    pub fn partition_key(&self) -> (&str, &str) {
        (&self.hotel_name, &self.room_name)
    }
}

/// An upstream row after column mapping, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub hotel_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub room_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub request_timestamp: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub user_query: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub chatbot_response: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timecost")]
    pub response_timecost: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub user_intent: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawRecord {
    /// Normalizes the row into a [`ConversationRecord`].
    ///
    /// Blank categorical fields become [`UNKNOWN`]; an unparseable timestamp
    /// becomes `None` and is logged, never defaulted.
    pub fn into_record(self) -> ConversationRecord {
        let raw_timestamp = self.request_timestamp.unwrap_or_default();
        let request_timestamp = normalize_timestamp(&raw_timestamp);
        if request_timestamp.is_none() {
            tracing::debug!(raw = %raw_timestamp, "unparseable request timestamp");
        }

        ConversationRecord {
            hotel_name: categorical(self.hotel_name),
            room_name: categorical(self.room_name),
            conversation_id: self.conversation_id.unwrap_or_default(),
            request_timestamp,
            raw_timestamp,
            user_query: self.user_query.unwrap_or_default(),
            chatbot_response: self.chatbot_response.unwrap_or_default(),
            response_timecost: self.response_timecost,
            user_intent: categorical(self.user_intent),
            raw_payload: self.data,
        }
    }
}

/// Normalizes a whole upload, enforcing the batch size limit.
pub fn normalize_batch(rows: Vec<RawRecord>) -> Result<Vec<ConversationRecord>, BatchError> {
    if rows.len() > MAX_BATCH_RECORDS {
        return Err(BatchError::TooLarge { count: rows.len() });
    }
    let records: Vec<_> = rows.into_iter().map(RawRecord::into_record).collect();
    let unparseable = records
        .iter()
        .filter(|r| r.request_timestamp.is_none())
        .count();
    tracing::debug!(total = records.len(), unparseable, "normalized batch");
    Ok(records)
}

fn categorical(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Accepts strings, numbers or null for fields that exporters emit either way.
fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Numeric coercion for latency: blanks and non-numeric text become `None`.
fn deserialize_timecost<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}
