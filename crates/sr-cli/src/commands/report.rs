//! Report command: filter, segment and render a batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use sr_core::{
    DstOverride, ExportOptions, ExportedReport, GapPolicy, RecordFilter, export_report,
    parse_time_of_day,
};

use crate::Config;
use crate::commands::input::load_records;
use crate::commands::util::parse_date;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// JSON Lines input file, or `-` for stdin.
    pub input: PathBuf,

    /// Directory to write the report file to (defaults to `output_dir`).
    #[arg(long, conflicts_with = "stdout")]
    pub out_dir: Option<PathBuf>,

    /// Print the report instead of writing a file.
    #[arg(long)]
    pub stdout: bool,

    /// Zone the input timestamps are recorded in.
    #[arg(long)]
    pub source_tz: Option<String>,

    /// Zone to render the report in.
    #[arg(long)]
    pub target_tz: Option<String>,

    /// Daylight-saving override: auto, `force_dst` or `force_standard`.
    #[arg(long)]
    pub dst: Option<DstOverride>,

    /// Nominal check-in time (HH:MM, hotel time).
    #[arg(long)]
    pub checkin: Option<String>,

    /// Nominal checkout time (HH:MM, hotel time).
    #[arg(long)]
    pub checkout: Option<String>,

    /// Gap policy: `merge_into_next`, `separate_gap_session` or exclude.
    #[arg(long)]
    pub gap_policy: Option<GapPolicy>,

    /// Only include conversations on or after this date.
    #[arg(long)]
    pub from: Option<String>,

    /// Only include conversations on or before this date.
    #[arg(long)]
    pub to: Option<String>,

    /// Only include responses at least this slow (seconds).
    #[arg(long)]
    pub min_latency: Option<f64>,

    /// Only include responses at most this slow (seconds).
    #[arg(long)]
    pub max_latency: Option<f64>,

    /// Date printed in the header and file name (defaults to today).
    #[arg(long)]
    pub export_date: Option<String>,
}

impl ReportArgs {
    fn filter(&self) -> Result<RecordFilter> {
        let filter = RecordFilter {
            start_date: self.from.as_deref().map(parse_date).transpose()?,
            end_date: self.to.as_deref().map(parse_date).transpose()?,
            min_latency: self.min_latency,
            max_latency: self.max_latency,
        };
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            anyhow::ensure!(start <= end, "--from {start} is after --to {end}");
        }
        Ok(filter)
    }

    /// Merges flags over the loaded configuration.
    fn export_options(&self, config: &Config) -> Result<ExportOptions> {
        let checkin = self.checkin.as_deref().unwrap_or(&config.checkin);
        let checkout = self.checkout.as_deref().unwrap_or(&config.checkout);
        let export_date = match self.export_date.as_deref() {
            Some(value) => parse_date(value)?,
            None => Local::now().date_naive(),
        };

        Ok(ExportOptions {
            source_timezone: self
                .source_tz
                .clone()
                .unwrap_or_else(|| config.source_timezone.clone()),
            target_timezone: self
                .target_tz
                .clone()
                .unwrap_or_else(|| config.target_timezone.clone()),
            dst_override: self.dst.unwrap_or(config.dst_override),
            checkin: parse_time_of_day(checkin).context("invalid check-in time")?,
            checkout: parse_time_of_day(checkout).context("invalid checkout time")?,
            gap_policy: self.gap_policy.unwrap_or(config.gap_policy),
            export_date,
        })
    }
}

pub fn run(args: &ReportArgs, config: &Config) -> Result<()> {
    let options = args.export_options(config)?;
    let filter = args.filter()?;

    let records = filter.apply(load_records(&args.input)?);
    let report = export_report(&records, &options).context("failed to build report")?;

    if report.timezone_fallback {
        eprintln!(
            "warning: could not convert {} -> {}; report uses unconverted timestamps",
            options.source_timezone, options.target_timezone
        );
    }

    if args.stdout {
        println!("{}", report.content);
        return Ok(());
    }

    let dir = args
        .out_dir
        .as_deref()
        .unwrap_or(config.output_dir.as_path());
    let path = write_report(&report, dir)?;
    println!(
        "Wrote {} sessions to {}",
        report.session_count,
        path.display()
    );
    if report.unparseable > 0 {
        println!("Skipped {} records with unparseable timestamps", report.unparseable);
    }
    if report.excluded_gap > 0 {
        println!("Excluded {} gap-period records", report.excluded_gap);
    }
    Ok(())
}

fn write_report(report: &ExportedReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(&report.filename);
    std::fs::write(&path, &report.content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        args: ReportArgs,
    }

    fn parse(argv: &[&str]) -> ReportArgs {
        Harness::parse_from(std::iter::once("sr").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "batch.jsonl",
            "--target-tz",
            "UTC",
            "--checkin",
            "15:30",
            "--gap-policy",
            "exclude",
            "--dst",
            "force_dst",
            "--export-date",
            "2024-01-12",
        ]);
        let options = args.export_options(&Config::default()).unwrap();

        assert_eq!(options.source_timezone, "Asia/Taipei");
        assert_eq!(options.target_timezone, "UTC");
        assert_eq!(options.checkin, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
        assert_eq!(options.checkout, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert_eq!(options.gap_policy, GapPolicy::Exclude);
        assert_eq!(options.dst_override, DstOverride::ForceDst);
        assert_eq!(
            options.export_date,
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        );
    }

    #[test]
    fn test_invalid_checkin_is_reported() {
        let args = parse(&["batch.jsonl", "--checkin", "2pm"]);
        let err = args.export_options(&Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid check-in time"));
    }

    #[test]
    fn test_filter_from_flags() {
        let args = parse(&[
            "batch.jsonl",
            "--from",
            "2024-01-10",
            "--to",
            "2024-01-11",
            "--max-latency",
            "5",
        ]);
        let filter = args.filter().unwrap();
        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2024, 1, 11));
        assert_eq!(filter.max_latency, Some(5.0));
        assert_eq!(filter.min_latency, None);
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let args = parse(&["batch.jsonl", "--from", "2024-01-12", "--to", "2024-01-10"]);
        assert!(args.filter().is_err());
    }

    #[test]
    fn test_stdout_conflicts_with_out_dir() {
        let result = Harness::try_parse_from(["sr", "batch.jsonl", "--stdout", "--out-dir", "x"]);
        assert!(result.is_err());
    }
}
