//! Plain-text stay report rendering.

use chrono::NaiveDate;

use crate::alarm::alarm_annotation;
use crate::record::ConversationRecord;
use crate::segment::StaySession;

const TITLE: &str = "智能音箱對話分析報告";
const RULE_WIDTH: usize = 80;
const NOT_AVAILABLE: &str = "N/A";
const SESSION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const CONVERSATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header suffix naming the zone the report's times are expressed in.
pub fn timezone_label(target_timezone: Option<&str>) -> String {
    match target_timezone.map(str::trim) {
        None | Some("") => String::new(),
        Some("UTC") => " (UTC時間)".to_string(),
        Some(id) if id.contains("Asia/Taipei") => " (台北時間 UTC+8)".to_string(),
        Some(id) => format!(" ({id})"),
    }
}

/// Renders sessions into the report text.
///
/// Sessions are printed in the order given; conversation timestamps are
/// printed as stored, session boundaries through the display window.
pub fn format_report(
    sessions: &[StaySession],
    export_date: NaiveDate,
    target_timezone: Option<&str>,
) -> String {
    let mut lines = vec![
        TITLE.to_string(),
        format!(
            "導出日期：{}{}",
            export_date.format("%Y-%m-%d"),
            timezone_label(target_timezone)
        ),
        format!("總共 {} 個住宿時段", sessions.len()),
        "=".repeat(RULE_WIDTH),
        String::new(),
    ];

    for session in sessions {
        push_session(&mut lines, session);
    }

    lines.join("\n")
}

fn push_session(lines: &mut Vec<String>, session: &StaySession) {
    let start = session.display_start.format(SESSION_TIME_FORMAT);
    let end = session.display_end.format(SESSION_TIME_FORMAT);

    if session.is_gap_period {
        lines.push(format!(
            "## 用戶體驗報告 ({} - {}) [gap period]",
            session.hotel, session.room
        ));
        lines.push(format!("### 空窗期間：{start} ~ {end}"));
    } else {
        lines.push(format!("## 用戶體驗報告 ({} - {})", session.hotel, session.room));
        lines.push(format!("### 住宿期間：{start} ~ {end}"));
    }
    lines.push(String::new());

    for conversation in &session.conversations {
        push_conversation(lines, conversation);
    }

    lines.push("---".to_string());
    lines.push(String::new());
}

fn push_conversation(lines: &mut Vec<String>, conversation: &ConversationRecord) {
    let timestamp = conversation.request_timestamp.map_or_else(
        || conversation.raw_timestamp.clone(),
        |ts| ts.format(CONVERSATION_TIME_FORMAT).to_string(),
    );
    let id = if conversation.conversation_id.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        conversation.conversation_id.as_str()
    };
    let latency = conversation
        .response_timecost
        .map_or_else(|| NOT_AVAILABLE.to_string(), |secs| format!("{secs:.2}s"));

    let mut response = format!(
        "chatbot: {} (思考時間:{latency})",
        conversation.chatbot_response
    );
    if let Some(annotation) = alarm_annotation(
        &conversation.user_intent,
        &conversation.raw_payload,
        &conversation.conversation_id,
    ) {
        response.push(' ');
        response.push_str(&annotation);
    }

    lines.push(format!("[{timestamp}], (ID: {id})"));
    lines.push(format!("user：{}", conversation.user_query));
    lines.push(response);
    lines.push(String::new());
}
