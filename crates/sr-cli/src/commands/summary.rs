//! Summary command: a quick look at a batch before exporting.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use sr_core::BatchSummary;

use crate::commands::input::load_records;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn run(input: &Path, json: bool) -> Result<()> {
    let records = load_records(input)?;
    let summary = BatchSummary::from_records(&records);

    if json {
        let output =
            serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
        println!("{output}");
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}

/// Human-readable summary text.
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Records:     {}", summary.total);
    let _ = writeln!(output, "Unparseable: {}", summary.unparseable);

    match (summary.first_timestamp, summary.last_timestamp) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                output,
                "Span:        {} ~ {}",
                first.format(TIME_FORMAT),
                last.format(TIME_FORMAT)
            );
        }
        _ => {
            let _ = writeln!(output, "Span:        -");
        }
    }

    match (summary.min_latency, summary.max_latency) {
        (Some(min), Some(max)) => {
            let _ = writeln!(output, "Latency:     {min:.2}s ~ {max:.2}s");
        }
        _ => {
            let _ = writeln!(output, "Latency:     -");
        }
    }

    let hotels = if summary.hotels.is_empty() {
        "-".to_string()
    } else {
        summary.hotels.join(", ")
    };
    let _ = writeln!(
        output,
        "Hotels:      {hotels} ({} rooms)",
        summary.room_count
    );

    output.push('\n');
    let _ = writeln!(output, "Risk levels:");
    for bucket in &summary.risk {
        let _ = writeln!(output, "  {}: {}", bucket.level, bucket.count);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use sr_core::RawRecord;

    fn rec(hotel: &str, room: &str, ts: &str, latency: Option<f64>) -> sr_core::ConversationRecord {
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
    fn test_summary_text() {
        let records = vec![
            rec("Grand", "101", "2024-01-10 15:00:00", Some(1.0)),
            rec("Grand", "102", "2024-01-09 09:00:00", Some(9.5)),
            rec("Harbor", "101", "garbage", None),
            rec("Grand", "101", "2024-01-11 10:00:00", Some(4.0)),
        ];
        let output = format_summary(&BatchSummary::from_records(&records));
        assert_snapshot!(output);
    }

    #[test]
    fn test_summary_text_for_empty_batch() {
        let output = format_summary(&BatchSummary::from_records(&[]));
        assert!(output.contains("Records:     0\n"));
        assert!(output.contains("Span:        -\n"));
        assert!(output.contains("Latency:     -\n"));
        assert!(output.contains("Hotels:      - (0 rooms)\n"));
    }
}
