use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use tracing::debug;

use crate::clock::Clock;
use crate::models::{ArtistStatus, Event, EventFilter};
use crate::outcome::Outcome;
use crate::source::EventSource;
use crate::utils::locale_cmp;

/// Derived artist and schedule views over an [`EventSource`].
///
/// Every call loads a fresh snapshot; nothing is cached between calls. A
/// degraded load carries through as a degraded outcome with the empty or zero
/// fallback value.
#[derive(Clone)]
pub struct EventQueryService {
    source: Arc<dyn EventSource>,
    clock: Clock,
}

impl EventQueryService {
    pub fn new(source: Arc<dyn EventSource>, clock: Clock) -> Self {
        Self { source, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn all_events(&self, filter: &EventFilter) -> Outcome<Vec<Event>> {
        self.source.load(filter).await
    }

    pub async fn list_artist_names(&self) -> Outcome<Vec<String>> {
        self.source
            .load(&EventFilter::default())
            .await
            .map(|events| artist_names(&events))
    }

    pub async fn list_artist_options(&self) -> Outcome<Vec<ArtistStatus>> {
        let today = self.today();
        self.source
            .load(&EventFilter::default())
            .await
            .map(|events| artist_options(&events, today))
    }

    pub async fn schedule_for_artist(&self, artist: &str) -> Outcome<Vec<Event>> {
        if artist.is_empty() {
            return Outcome::Fresh(Vec::new());
        }
        let today = self.today();
        let out = self
            .source
            .load(&EventFilter::by_artist(artist))
            .await
            .map(|events| upcoming(events, today));
        debug!("{} upcoming events for {artist}", out.value().len());
        out
    }

    pub async fn events_on_date(&self, date: &str) -> Outcome<Vec<Event>> {
        if date.is_empty() {
            return Outcome::Fresh(Vec::new());
        }
        let out = self.source.load(&EventFilter::by_date(date)).await;
        debug!("{} events on {date}", out.value().len());
        out
    }

    pub async fn count_on_date(&self, date: &str) -> Outcome<usize> {
        self.events_on_date(date).await.map(|events| events.len())
    }
}

pub fn artist_names(events: &[Event]) -> Vec<String> {
    let mut names: Vec<String> = events.iter().map(|e| e.artist.clone()).collect();
    names.sort_by(|a, b| locale_cmp(a, b));
    names.dedup();
    names
}

/// One status per artist. An artist has a schedule if any of its events is
/// on or after `today`; the flag only ever moves from false to true.
pub fn artist_options(events: &[Event], today: NaiveDate) -> Vec<ArtistStatus> {
    let mut flags: HashMap<&str, bool> = HashMap::new();
    for event in events {
        let flag = flags.entry(event.artist.as_str()).or_insert(false);
        *flag |= event.is_upcoming(today);
    }

    let mut out: Vec<ArtistStatus> = flags
        .into_iter()
        .map(|(name, has_schedule)| ArtistStatus {
            name: name.to_string(),
            has_schedule,
        })
        .collect();
    out.sort_by(|a, b| locale_cmp(&a.name, &b.name));
    out
}

pub fn upcoming(events: Vec<Event>, today: NaiveDate) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| event.is_upcoming(today))
        .collect()
}
