use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub artist: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub date: String, // canonical yyyy/MM/dd, empty when the record has none
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new(artist: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            date: date.into(),
            extra: Map::new(),
        }
    }

    pub fn venue(&self) -> Option<&str> {
        self.extra.get("venue").and_then(Value::as_str)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        utils::parse_event_date(&self.date)
    }

    /// True when the event falls on `today` or later. Undated events never are.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.day().map(|day| day >= today).unwrap_or(false)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ArtistStatus {
    pub name: String,
    #[serde(rename = "hasSchedule")]
    pub has_schedule: bool,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EventFilter {
    pub artist: Option<String>,
    pub date: Option<String>,
}

impl EventFilter {
    pub fn by_artist(artist: impl Into<String>) -> Self {
        Self {
            artist: Some(artist.into()),
            date: None,
        }
    }

    pub fn by_date(date: impl Into<String>) -> Self {
        Self {
            artist: None,
            date: Some(date.into()),
        }
    }

    /// Date takes precedence over artist; blank values are ignored.
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        if let Some(date) = non_blank(&self.date) {
            return events.into_iter().filter(|e| e.date == date).collect();
        }
        if let Some(artist) = non_blank(&self.artist) {
            return events.into_iter().filter(|e| e.artist == artist).collect();
        }
        events
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Event> {
        vec![
            Event::new("A", "2025/01/01"),
            Event::new("B", "2025/01/01"),
            Event::new("A", "2099/01/01"),
        ]
    }

    #[test]
    fn date_filter_wins_over_artist() {
        let filter = EventFilter {
            artist: Some("A".into()),
            date: Some("2025/01/01".into()),
        };
        let out = filter.apply(sample());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.date == "2025/01/01"));
    }

    #[test]
    fn artist_filter_is_exact() {
        assert_eq!(EventFilter::by_artist("A").apply(sample()).len(), 2);
        assert!(EventFilter::by_artist("a").apply(sample()).is_empty());
    }

    #[test]
    fn blank_filter_returns_everything_in_order() {
        let filter = EventFilter {
            artist: Some(String::new()),
            date: Some(String::new()),
        };
        assert_eq!(filter.apply(sample()), sample());
    }

    #[test]
    fn extra_fields_pass_through() {
        let raw = json!({
            "artist": "A",
            "date": "2025/01/01",
            "venue": "Fireloop",
            "note": ""
        });
        let event: Event = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(event.venue(), Some("Fireloop"));
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn undated_record_does_not_break_the_document() {
        let raw = json!([
            {"artist": "A", "date": "2025/01/01"},
            {"artist": "B"},
            {"artist": "C", "date": null}
        ]);
        let events: Vec<Event> = serde_json::from_value(raw).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].date, "");
        assert_eq!(events[2].date, "");
        assert!(!events[2].is_upcoming(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }

    #[test]
    fn status_uses_camel_case_flag() {
        let status = ArtistStatus {
            name: "A".into(),
            has_schedule: true,
        };
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({"name": "A", "hasSchedule": true})
        );
    }

    #[test]
    fn unparseable_date_is_never_upcoming() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(!Event::new("A", "TBA").is_upcoming(today));
        assert!(Event::new("A", "2025/06/01").is_upcoming(today));
        assert!(!Event::new("A", "2025/05/31").is_upcoming(today));
    }
}
