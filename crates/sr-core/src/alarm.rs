//! Alarm entity extraction from opaque conversation payloads.
//!
//! Alarm requests carry a `uni_df_datetime` entity with a
//! `startDateTime`/`endDateTime` pair. When both ends are identical the pair
//! names a single point in time, which the report prints next to the
//! response. Payload shapes vary between exporter versions: the value may be
//! a JSON string, a one-element list or an object.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::timestamp::normalize_timestamp;

const ALARM_INTENT: &str = "alarm";
const DATETIME_ENTITY: &str = "uni_df_datetime";

/// A resolved alarm time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmEntity {
    pub at: NaiveDateTime,
}

impl AlarmEntity {
    /// Inline annotation for the report, e.g. `[鬧鐘時間: 2025-01-01 09:00]`.
    pub fn annotation(&self) -> String {
        format!("[鬧鐘時間: {}]", self.at.format("%Y-%m-%d %H:%M"))
    }
}

/// Outcome of reading a payload.
///
/// `Absent` means there is legitimately nothing to annotate; `Malformed`
/// means the payload was there but could not be read. Neither affects the
/// report beyond the missing annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmExtraction {
    Found(AlarmEntity),
    Absent,
    Malformed(String),
}

impl AlarmExtraction {
    pub fn annotation(&self) -> Option<String> {
        match self {
            Self::Found(entity) => Some(entity.annotation()),
            Self::Absent | Self::Malformed(_) => None,
        }
    }
}

/// Reads the alarm time from a conversation payload.
pub fn extract_alarm(intent: &str, payload: &Value) -> AlarmExtraction {
    if !intent.trim().eq_ignore_ascii_case(ALARM_INTENT) {
        return AlarmExtraction::Absent;
    }

    let decoded;
    let mut value = payload;
    if let Value::String(text) = payload {
        if text.trim().is_empty() {
            return AlarmExtraction::Absent;
        }
        decoded = match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            Err(e) => return AlarmExtraction::Malformed(format!("payload is not JSON: {e}")),
        };
        value = &decoded;
    }

    let value = match value {
        Value::Null => return AlarmExtraction::Absent,
        Value::Array(items) => match items.as_slice() {
            [] => return AlarmExtraction::Absent,
            [single] => single,
            _ => {
                return AlarmExtraction::Malformed(format!(
                    "expected a single-element list, got {} elements",
                    items.len()
                ));
            }
        },
        other => other,
    };

    let Some(object) = value.as_object() else {
        return AlarmExtraction::Malformed("payload is not an object".to_string());
    };
    let Some(entity) = object.get(DATETIME_ENTITY) else {
        return AlarmExtraction::Absent;
    };
    let Some(entity) = entity.as_object() else {
        return AlarmExtraction::Malformed(format!("{DATETIME_ENTITY} is not an object"));
    };

    let (Some(start), Some(end)) = (entity.get("startDateTime"), entity.get("endDateTime")) else {
        return AlarmExtraction::Absent;
    };
    let (Some(start), Some(end)) = (start.as_str(), end.as_str()) else {
        return AlarmExtraction::Malformed("startDateTime/endDateTime are not strings".to_string());
    };
    if start != end {
        return AlarmExtraction::Absent;
    }

    normalize_timestamp(start).map_or_else(
        || AlarmExtraction::Malformed(format!("unparseable alarm time: {start}")),
        |at| AlarmExtraction::Found(AlarmEntity { at }),
    )
}

/// Annotation for a conversation, logging payloads that could not be read.
pub fn alarm_annotation(intent: &str, payload: &Value, conversation_id: &str) -> Option<String> {
    let extraction = extract_alarm(intent, payload);
    if let AlarmExtraction::Malformed(reason) = &extraction {
        tracing::debug!(conversation_id, %reason, "ignoring malformed alarm payload");
    }
    extraction.annotation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point_payload() -> Value {
        json!({"uni_df_datetime": {
            "startDateTime": "2025-01-01T09:00:00Z",
            "endDateTime": "2025-01-01T09:00:00Z"
        }})
    }

    #[test]
    fn test_point_in_time_alarm_is_annotated() {
        let annotation = alarm_annotation("alarm", &point_payload(), "c1").unwrap();
        assert_eq!(annotation, "[鬧鐘時間: 2025-01-01 09:00]");
        assert!(annotation.contains("2025-01-01 09:00"));
    }

    #[test]
    fn test_intent_match_is_case_insensitive() {
        assert!(matches!(
            extract_alarm("ALARM", &point_payload()),
            AlarmExtraction::Found(_)
        ));
        assert_eq!(
            extract_alarm("weather", &point_payload()),
            AlarmExtraction::Absent
        );
    }

    #[test]
    fn test_range_yields_no_annotation() {
        let payload = json!({"uni_df_datetime": {
            "startDateTime": "2025-01-01T09:00:00Z",
            "endDateTime": "2025-01-01T10:00:00Z"
        }});
        assert_eq!(extract_alarm("alarm", &payload), AlarmExtraction::Absent);
    }

    #[test]
    fn test_string_and_list_wrappers_are_unwrapped() {
        let as_string = Value::String(point_payload().to_string());
        assert!(matches!(
            extract_alarm("alarm", &as_string),
            AlarmExtraction::Found(_)
        ));

        let as_list = json!([point_payload()]);
        assert!(matches!(
            extract_alarm("alarm", &as_list),
            AlarmExtraction::Found(_)
        ));

        let list_in_string = Value::String(json!([point_payload()]).to_string());
        assert!(matches!(
            extract_alarm("alarm", &list_in_string),
            AlarmExtraction::Found(_)
        ));
    }

    #[test]
    fn test_missing_pieces_are_absent() {
        assert_eq!(extract_alarm("alarm", &Value::Null), AlarmExtraction::Absent);
        assert_eq!(extract_alarm("alarm", &json!([])), AlarmExtraction::Absent);
        assert_eq!(extract_alarm("alarm", &json!({})), AlarmExtraction::Absent);
        assert_eq!(
            extract_alarm(
                "alarm",
                &json!({"uni_df_datetime": {"startDateTime": "2025-01-01T09:00:00Z"}})
            ),
            AlarmExtraction::Absent
        );
    }

    #[test]
    fn test_malformed_payloads_never_annotate() {
        let cases = [
            Value::String("{not json".to_string()),
            json!([1, 2]),
            json!(7),
            json!({"uni_df_datetime": "tomorrow"}),
            json!({"uni_df_datetime": {"startDateTime": 1, "endDateTime": 1}}),
            json!({"uni_df_datetime": {"startDateTime": "soon", "endDateTime": "soon"}}),
        ];
        for payload in cases {
            let extraction = extract_alarm("alarm", &payload);
            assert!(
                matches!(extraction, AlarmExtraction::Malformed(_)),
                "{payload} should be malformed, got {extraction:?}"
            );
            assert_eq!(alarm_annotation("alarm", &payload, "c1"), None);
        }
    }
}
