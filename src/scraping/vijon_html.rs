use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::base::{self, ShowListing};
use super::VenueScraper;
use crate::models::Event;
use crate::utils;

const SCRAPING_MONTHS: u32 = 6;

static DETAIL_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="/schedule/detail/"]"#).expect("vijon detail link selector")
});
static DAY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.day").expect("vijon day selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.scheduleCnt h1").expect("vijon title selector"));
static ARTIST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.artist").expect("vijon artist selector"));

static DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\.(\d{1,2})\.(\d{1,2})").expect("vijon date regex"));
static WEEKDAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("vijon weekday regex"));

/// Venues sharing the vijon schedule system: a monthly calendar page linking
/// to one detail page per show.
pub struct VijonSystem {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

pub const VENUES: [VijonSystem; 5] = [
    VijonSystem {
        id: "vijon",
        name: "北堀江club vijon",
        url: "https://vijon.jp",
    },
    VijonSystem {
        id: "bangboo",
        name: "梅田BANGBOO",
        url: "https://bangboo.jp",
    },
    VijonSystem {
        id: "drop",
        name: "アメリカ村DROP",
        url: "https://clubdrop.jp",
    },
    VijonSystem {
        id: "varon",
        name: "VARON",
        url: "https://osaka-varon.jp",
    },
    VijonSystem {
        id: "zeela",
        name: "Zeela",
        url: "https://osaka-zeela.jp",
    },
];

impl VenueScraper for VijonSystem {
    fn venue_id(&self) -> &'static str {
        self.id
    }

    fn venue_name(&self) -> &'static str {
        self.name
    }

    fn venue_url(&self) -> &'static str {
        self.url
    }

    fn fetch(&self) -> Result<Vec<Event>> {
        let today = Local::now().date_naive();
        let mut seen = HashSet::new();
        let mut events = Vec::new();

        for (year, month) in months_ahead(today, SCRAPING_MONTHS) {
            let calendar_url = self.calendar_url(year, month);
            let html = match base::fetch_html(&calendar_url) {
                Ok(html) => html,
                Err(err) => {
                    warn!("{} calendar {calendar_url} failed: {err:#}", self.id);
                    continue;
                }
            };

            let links = self.parse_calendar(&html);
            info!("{}: {} shows in {year}/{month:02}", self.id, links.len());
            for link in links {
                if !seen.insert(link.clone()) {
                    continue;
                }
                match base::fetch_html(&link) {
                    Ok(detail) => events.extend(self.parse_detail(&detail, &link)),
                    Err(err) => warn!("{} detail {link} failed: {err:#}", self.id),
                }
            }
        }

        base::fail_if_empty(self.id, events)
    }
}

impl VijonSystem {
    fn calendar_url(&self, year: i32, month: u32) -> String {
        format!("{}/schedule/calendar/{year}/{month:02}/", self.url)
    }

    pub(crate) fn parse_calendar(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&DETAIL_LINK_SELECTOR)
            .filter_map(|link| base::absolute_url(self.url, link.value().attr("href")))
            .collect()
    }

    pub(crate) fn parse_detail(&self, html: &str, detail_url: &str) -> Vec<Event> {
        let document = Html::parse_document(html);

        let day_text = match document.select(&DAY_SELECTOR).next() {
            Some(elem) => base::inner_text(elem),
            None => {
                debug!("no date at {detail_url}");
                return Vec::new();
            }
        };
        let date = match DAY_RE.captures(&day_text).and_then(|caps| {
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        }) {
            Some(date) => date,
            None => {
                debug!("unreadable date {day_text:?} at {detail_url}");
                return Vec::new();
            }
        };
        let day = WEEKDAY_RE
            .captures(&day_text)
            .and_then(|caps| base::weekday_jp_from_label(&caps[1]))
            .unwrap_or_else(|| base::weekday_jp(date));

        let artists = match document.select(&ARTIST_SELECTOR).next() {
            Some(elem) => base::inner_text(elem),
            None => {
                debug!("no artists at {detail_url}");
                return Vec::new();
            }
        };

        let listing = ShowListing {
            date: utils::format_date(date),
            day: day.to_string(),
            title: document
                .select(&TITLE_SELECTOR)
                .next()
                .map(base::inner_text)
                .unwrap_or_default(),
            url: detail_url.to_string(),
            venue: self.name.to_string(),
            note: String::new(),
        };
        listing.events_for(artists.split('/'))
    }
}

/// `(year, month)` for the current month and the `count - 1` after it.
fn months_ahead(today: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    let start = today.year() * 12 + today.month0() as i32;
    (0..count as i32)
        .map(|offset| {
            let index = start + offset;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}
