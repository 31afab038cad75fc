use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate};
use dirs::data_dir;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

pub const API_DATE_FORMAT: &str = "%Y/%m/%d";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let root = base.join("livesearch");
    if let Err(err) = fs::create_dir_all(&root) {
        warn!("failed to create data root {:?}: {err}", root);
    }
    root
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{4})[/-](\d{1,2})[/-](\d{1,2})(?:$|[T\s])").expect("valid date regex")
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!("failed to create parent {:?}: {err}", parent);
        }
    }
}

/// Calendar day of an event date. Accepts `yyyy/MM/dd`, `yyyy-MM-dd` and
/// either of those followed by a time part.
pub fn parse_event_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(API_DATE_FORMAT).to_string()
}

/// Normalizes an ISO date, an RFC 3339 timestamp or an already canonical
/// value to `yyyy/MM/dd`. Timestamps keep the calendar day of their own offset.
pub fn format_date_for_api(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(format_date(dt.date_naive()));
    }
    parse_event_date(trimmed).map(format_date)
}

/// Case-insensitive ordering, lowercase first on ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
