//! Pin-name generation for uploaded reports.
//!
//! Content stores accept a human-readable name alongside the upload; the
//! name never affects the content identifier, but it is what operators see
//! in their pinning dashboard, so it carries the report label and a UTC
//! timestamp.

use chrono::{DateTime, Utc};

/// Turns free-form text into a name-safe slug.
///
/// Keeps ASCII alphanumerics, `_` and `-`; every other run of characters
/// collapses to a single `-`. Falls back to `"report"` when nothing
/// survives.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

/// Builds the pin name for an uploaded report.
///
/// Shape: `report_{slug}_{yyyymmddThhmmssZ}`.
pub fn pin_name(label: &str, at: DateTime<Utc>) -> String {
    format!("report_{}_{}", slugify(label), at.format("%Y%m%dT%H%M%SZ"))
}
