use std::{thread, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{ElementRef, Selector};
use serde_json::Value;
use tracing::warn;

use crate::models::Event;
use crate::utils;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const MAX_RETRIES: u32 = 3;

static ARTIST_NOISE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\([^)]+\)",
        r"（[^）]+）",
        r"【[^】]+】",
        r"\[[^\]]+\]",
        r"［[^］]+］",
        r"feat\.[^　]*",
        r"from\s+[^　]*",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid artist noise regex"))
    .collect()
});

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digits regex"));

/// How a venue writes its dates before canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `2025/02/01`
    Full,
    /// `2.1` or `2025.2.1`
    Dot,
    /// `2/1`
    SlashShort,
    /// any text holding month/day or year/month/day numbers
    Mixed,
}

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn absolute_url(base: &str, href: Option<&str>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(href).ok().map(|u| u.to_string())
}

pub fn fetch_html(url: &str) -> Result<String> {
    static CLIENT: Lazy<Client> = Lazy::new(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("livesearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("http client")
    });

    let mut last_err = None;
    for attempt in 0..MAX_RETRIES {
        let result = CLIENT
            .get(url)
            .send()
            .with_context(|| format!("request failed for {url}"))
            .and_then(|response| {
                response
                    .error_for_status()
                    .with_context(|| format!("non-success status for {url}"))
            })
            .and_then(|response| {
                response
                    .text()
                    .with_context(|| format!("unable to read response body for {url}"))
            });
        match result {
            Ok(body) => return Ok(body),
            Err(err) => {
                warn!("attempt {}/{MAX_RETRIES} for {url} failed: {err:#}", attempt + 1);
                last_err = Some(err);
                if attempt + 1 < MAX_RETRIES {
                    thread::sleep(Duration::from_secs(1 << attempt));
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("no attempt made for {url}")))
}

/// Strips bracketed annotations, `feat.` credits and `from ...` affiliations.
pub fn clean_artist_name(name: &str) -> String {
    let mut cleaned = name.trim().to_string();
    for re in ARTIST_NOISE_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

/// Canonical `yyyy/MM/dd` for a venue date. Two-digit years are 20xx; a
/// month earlier than `today`'s in the current year rolls to next year.
pub fn parse_date(text: &str, format: DateFormat, today: NaiveDate) -> Option<String> {
    let numbers = match format {
        DateFormat::Full => split_numbers(text, '/').filter(|n| n.len() == 3)?,
        DateFormat::Dot => split_numbers(text, '.').filter(|n| n.len() == 2 || n.len() == 3)?,
        DateFormat::SlashShort => split_numbers(text, '/').filter(|n| n.len() == 2)?,
        DateFormat::Mixed => {
            let found: Vec<i32> = DIGITS_RE
                .find_iter(text)
                .take(3)
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            if found.len() < 2 {
                return None;
            }
            found
        }
    };

    let (mut year, month, day) = match numbers.as_slice() {
        [month, day] => (today.year(), *month, *day),
        [year, month, day] => (*year, *month, *day),
        _ => return None,
    };
    if (10..100).contains(&year) {
        year += 2000;
    }
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    if month < today.month() && year == today.year() {
        year += 1;
    }
    NaiveDate::from_ymd_opt(year, month, day).map(utils::format_date)
}

fn split_numbers(text: &str, sep: char) -> Option<Vec<i32>> {
    text.trim()
        .split(sep)
        .map(|part| part.trim().parse::<i32>().ok())
        .collect()
}

pub fn weekday_jp(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// Japanese weekday for an English label such as `SAT` or `Sat`.
pub fn weekday_jp_from_label(label: &str) -> Option<&'static str> {
    let lowered = label.trim().to_ascii_lowercase();
    match lowered.get(..3)? {
        "mon" => Some("月"),
        "tue" => Some("火"),
        "wed" => Some("水"),
        "thu" => Some("木"),
        "fri" => Some("金"),
        "sat" => Some("土"),
        "sun" => Some("日"),
        _ => None,
    }
}

/// One dated show at a venue; every performer becomes its own event record.
#[derive(Debug, Clone)]
pub struct ShowListing {
    pub date: String,
    pub day: String,
    pub title: String,
    pub url: String,
    pub venue: String,
    pub note: String,
}

impl ShowListing {
    pub fn event_for(&self, artist: &str) -> Event {
        let mut event = Event::new(artist, self.date.clone());
        for (key, value) in [
            ("day", &self.day),
            ("title", &self.title),
            ("url", &self.url),
            ("venue", &self.venue),
            ("note", &self.note),
        ] {
            event
                .extra
                .insert(key.to_string(), Value::String(value.clone()));
        }
        event
    }

    pub fn events_for<I, S>(&self, names: I) -> Vec<Event>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| clean_artist_name(name.as_ref()))
            .filter(|artist| !artist.is_empty())
            .map(|artist| self.event_for(&artist))
            .collect()
    }
}

pub fn fail_if_empty<T>(venue_id: &str, events: Vec<T>) -> Result<Vec<T>> {
    if events.is_empty() {
        Err(anyhow!("no events scraped for {venue_id}"))
    } else {
        Ok(events)
    }
}
