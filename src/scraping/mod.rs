pub mod base;
pub mod fireloop_html;
pub mod vijon_html;

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Error};
use tracing::{info, warn};

use crate::models::Event;
use crate::utils;

pub trait VenueScraper: Send + Sync {
    fn venue_id(&self) -> &'static str;
    fn venue_name(&self) -> &'static str;
    fn venue_url(&self) -> &'static str;
    fn fetch(&self) -> anyhow::Result<Vec<Event>>;
}

fn active_scrapers() -> Vec<Box<dyn VenueScraper>> {
    let mut scrapers: Vec<Box<dyn VenueScraper>> = vec![Box::new(fireloop_html::Fireloop)];
    for venue in vijon_html::VENUES {
        scrapers.push(Box::new(venue));
    }
    scrapers
}

fn find_scraper(id: &str) -> Option<Box<dyn VenueScraper>> {
    active_scrapers()
        .into_iter()
        .find(|scraper| scraper.venue_id() == id)
}

pub fn run_all() -> anyhow::Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut errors: Vec<(String, Error)> = Vec::new();

    for scraper in active_scrapers() {
        let venue_id = scraper.venue_id().to_string();
        info!("scraping {} ({})", scraper.venue_name(), scraper.venue_url());
        match scraper.fetch() {
            Ok(mut scraped) => {
                info!("{venue_id}: {} events", scraped.len());
                events.append(&mut scraped);
            }
            Err(err) => {
                warn!("{venue_id} failed: {err:#}");
                errors.push((venue_id, err));
            }
        }
    }

    if events.is_empty() && !errors.is_empty() {
        let joined = errors
            .into_iter()
            .map(|(id, err)| format!("{id}: {err}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow::anyhow!("scrapers failed: {joined}"));
    }

    Ok(events)
}

pub fn run_single(id: &str) -> anyhow::Result<Vec<Event>> {
    let scraper = find_scraper(id).ok_or_else(|| anyhow::anyhow!("unknown venue id: {id}"))?;
    scraper.fetch()
}

/// Keeps the first record for each (date, artist, venue).
pub fn dedupe(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| {
            seen.insert((
                event.date.clone(),
                event.artist.clone(),
                event.venue().unwrap_or_default().to_string(),
            ))
        })
        .collect()
}

/// Writes the deduplicated events as the JSON document the API serves.
/// An empty scrape leaves any existing document untouched.
pub fn save_events(path: &Path, events: Vec<Event>) -> anyhow::Result<usize> {
    if events.is_empty() {
        warn!("no events to save, keeping {}", path.display());
        return Ok(0);
    }

    let total = events.len();
    let unique = dedupe(events);
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(&unique)?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;

    info!(
        "saved {} events to {} (removed {} duplicates)",
        unique.len(),
        path.display(),
        total - unique.len()
    );
    Ok(unique.len())
}
