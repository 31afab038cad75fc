use anyhow::Result;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

use super::base::{self, DateFormat, ShowListing};
use super::VenueScraper;
use crate::models::Event;

const URL: &str = "https://fireloop.net/schedule_now.shtml";
const VENUE_ID: &str = "fireloop";
const VENUE_NAME: &str = "寺田町Fireloop";

static DAY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.pager div.half-page.left").expect("fireloop day selector"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.datef").expect("fireloop date selector"));
static WEEKDAY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.weekday").expect("fireloop weekday selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.title").expect("fireloop title selector"));
static CAST_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.cast").expect("fireloop cast selector"));

pub struct Fireloop;

impl VenueScraper for Fireloop {
    fn venue_id(&self) -> &'static str {
        VENUE_ID
    }

    fn venue_name(&self) -> &'static str {
        VENUE_NAME
    }

    fn venue_url(&self) -> &'static str {
        URL
    }

    fn fetch(&self) -> Result<Vec<Event>> {
        let html = base::fetch_html(URL)?;
        base::fail_if_empty(VENUE_ID, self.parse_document(&html, Local::now().date_naive()))
    }
}

impl Fireloop {
    /// Each day block carries its `MMDD` in the element id.
    pub(crate) fn parse_document(&self, html: &str, today: NaiveDate) -> Vec<Event> {
        let document = Html::parse_document(html);
        let mut events = Vec::new();

        for block in document.select(&DAY_SELECTOR) {
            let date_id = block.value().attr("id").unwrap_or_default();
            let date_elem = match block.select(&DATE_SELECTOR).next() {
                Some(elem) if date_id.len() >= 3 => elem,
                _ => continue,
            };

            let date = match date_id
                .get(..2)
                .zip(date_id.get(2..))
                .and_then(|(month, day)| {
                    base::parse_date(&format!("{month}/{day}"), DateFormat::SlashShort, today)
                }) {
                Some(date) => date,
                None => {
                    debug!("skipping fireloop block with id {date_id:?}");
                    continue;
                }
            };

            let day = date_elem
                .select(&WEEKDAY_SELECTOR)
                .next()
                .and_then(|elem| base::weekday_jp_from_label(&base::inner_text(elem)))
                .unwrap_or_default();

            let date_text = base::inner_text(date_elem);
            let note = if date_text.contains("昼公演") {
                "昼公演"
            } else if date_text.contains("夜公演") {
                "夜公演"
            } else {
                ""
            };

            let cast = match block.select(&CAST_SELECTOR).next() {
                Some(cast) => cast,
                None => continue,
            };

            let listing = ShowListing {
                date,
                day: day.to_string(),
                title: base::first_text(&block, &TITLE_SELECTOR).unwrap_or_default(),
                url: format!("{URL}#{date_id}"),
                venue: VENUE_NAME.to_string(),
                note: note.to_string(),
            };
            events.extend(listing.events_for(cast.text()));
        }

        events
    }
}
