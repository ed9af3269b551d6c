//! Zones command: the supported timezone catalog.

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sr_core::{DstOverride, KNOWN_ZONES, describe_zone_status};

pub fn run(dst: DstOverride) -> Result<()> {
    print!("{}", format_zones(dst, Utc::now())?);
    Ok(())
}

/// One line per catalogued zone, with its DST status when it observes DST.
pub fn format_zones(dst: DstOverride, now: DateTime<Utc>) -> Result<String> {
    let mut output = String::new();
    for zone in &KNOWN_ZONES {
        let _ = write!(output, "{:<20} {}", zone.id, zone.label);
        if let Some(status) = describe_zone_status(zone.id, dst, now)? {
            let _ = write!(output, "  [{status}]");
        }
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_every_catalogued_zone_is_listed() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let output = format_zones(DstOverride::Auto, now).unwrap();
        assert_eq!(output.lines().count(), KNOWN_ZONES.len());
        for zone in &KNOWN_ZONES {
            assert!(output.contains(zone.id), "{} missing", zone.id);
        }
    }

    #[test]
    fn test_status_lines_only_for_dst_zones() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let output = format_zones(DstOverride::Auto, now).unwrap();

        let new_york = output
            .lines()
            .find(|line| line.starts_with("America/New_York"))
            .unwrap();
        assert!(new_york.ends_with("[夏令時: UTC-04:00 (自動)]"));

        let taipei = output
            .lines()
            .find(|line| line.starts_with("Asia/Taipei"))
            .unwrap();
        assert!(!taipei.contains('['));
    }

    #[test]
    fn test_forced_standard_status() {
        let now = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let output = format_zones(DstOverride::ForceStandard, now).unwrap();
        let london = output
            .lines()
            .find(|line| line.starts_with("Europe/London"))
            .unwrap();
        assert!(london.ends_with("[標準時間: UTC+00:00 (強制)]"));
    }
}
