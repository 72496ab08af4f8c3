//! Label normalization and scalar parsing shared by every layer.

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};

/// Rewrites a raw column label into a storage-safe identifier by
/// replacing each space, period, and hyphen with an underscore. Every
/// other character passes through unchanged and case is preserved, so
/// the operation is total and idempotent.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            ' ' | '.' | '-' => '_',
            other => other,
        })
        .collect()
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
    // Datetime-shaped cells keep their date part; anything else in the
    // cell beyond a recognized shape is an error, never ignored.
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed.date());
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_f64(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty value cannot be coerced to a number"));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| anyhow!("Failed to coerce '{value}' to a number"))
}

pub fn parse_i64(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| anyhow!("Failed to parse '{value}' as integer"))
}
