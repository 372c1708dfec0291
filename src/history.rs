//! Verification attempt history.
//!
//! Writes one row per attempt to a CSV file in append-only mode for crash safety.
//! Each row contains: timestamp, image, and the verdict fields.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::verify::VerificationResult;

/// CSV header row.
const CSV_HEADER: &str = "timestamp,image,source,score,tier,handle,identity_mismatch,fast_path";

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_history(path: &Path) -> Result<()> {
    if path.exists() {
        // Check if file has content
        let file = File::open(path).context("Failed to open existing history CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            // File has content, don't overwrite
            return Ok(());
        }
    }

    // Create new file with header
    let mut file = File::create(path).context("Failed to create history CSV")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write history CSV header")?;
    Ok(())
}

/// Quotes a field when it contains a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_row(at: DateTime<Local>, image: &str, result: &VerificationResult) -> String {
    let outcome = &result.outcome;
    [
        at.format("%Y-%m-%d %H:%M:%S").to_string(),
        csv_field(image),
        outcome.source.to_string(),
        outcome.score.clone().unwrap_or_default(),
        result.tier.role_name().unwrap_or_default().to_string(),
        csv_field(outcome.handle.as_deref().unwrap_or_default()),
        csv_field(result.identity_mismatch.as_deref().unwrap_or_default()),
        outcome.used_fast_path.to_string(),
    ]
    .join(",")
}

/// Appends a single verification attempt to the history CSV.
pub fn append_to_history(path: &Path, image: &str, result: &VerificationResult) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open history CSV for append")?;

    writeln!(file, "{}", format_row(Local::now(), image, result))
        .context("Failed to write history CSV row")?;
    Ok(())
}
