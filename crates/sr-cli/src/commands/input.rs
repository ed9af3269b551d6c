//! Loading conversation batches from JSON Lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use sr_core::{ConversationRecord, RawRecord, normalize_batch};

/// Reads and normalizes a batch from `path`, or stdin when `path` is `-`.
pub fn load_records(path: &Path) -> Result<Vec<ConversationRecord>> {
    let rows = if path.as_os_str() == "-" {
        parse_rows(io::stdin().lock())?
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        parse_rows(BufReader::new(file))
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    let records = normalize_batch(rows)?;
    tracing::debug!(count = records.len(), "loaded records");
    Ok(records)
}

fn parse_rows<R: BufRead>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let row: RawRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}
