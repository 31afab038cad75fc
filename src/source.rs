use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::{AppConfig, SourceConfig};
use crate::models::{Event, EventFilter};
use crate::outcome::Outcome;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Supplies the full list of events from one backing store.
#[async_trait]
pub trait EventSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch_all(&self) -> Result<Vec<Event>, SourceError>;

    /// Loads and filters events. Any failure degrades to an empty list.
    async fn load(&self, filter: &EventFilter) -> Outcome<Vec<Event>> {
        let result = self.fetch_all().await.map(|events| {
            debug!("loaded {} events from {}", events.len(), self.describe());
            filter.apply(events)
        });
        Outcome::recover(result, &format!("loading events from {}", self.describe()))
    }
}

pub struct RemoteSource {
    url: Url,
    client: Client,
}

impl RemoteSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let url = Url::parse(url).map_err(|err| SourceError::Http(err.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("livesearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SourceError::Http(err.to_string()))?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl EventSource for RemoteSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_all(&self) -> Result<Vec<Event>, SourceError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| SourceError::Http(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|err| SourceError::Http(err.to_string()))?;
        Ok(serde_json::from_str(&body)?)
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_all(&self) -> Result<Vec<Event>, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Fixed in-memory list, handed out as a fresh copy on every load.
pub struct MemorySource {
    events: Vec<Event>,
}

impl MemorySource {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl EventSource for MemorySource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn fetch_all(&self) -> Result<Vec<Event>, SourceError> {
        Ok(self.events.clone())
    }
}

pub fn from_config(config: &AppConfig) -> Result<Arc<dyn EventSource>, SourceError> {
    match &config.source {
        SourceConfig::Remote { url } => {
            let timeout = Duration::from_secs(config.request_timeout_secs);
            Ok(Arc::new(RemoteSource::new(url, timeout)?))
        }
        SourceConfig::File { path } => Ok(Arc::new(FileSource::new(path.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_events(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn file_source_filters_by_artist() {
        let file = write_events(
            r#"[
                {"artist": "A", "date": "2025/01/01", "venue": "Fireloop"},
                {"artist": "B", "date": "2025/01/02"},
                {"artist": "A", "date": "2025/01/03"}
            ]"#,
        );
        let source = FileSource::new(file.path());

        let out = source.load(&EventFilter::by_artist("A")).await;
        assert!(!out.is_degraded());
        let events = out.into_inner();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].venue(), Some("Fireloop"));
        assert_eq!(events[1].date, "2025/01/03");
    }

    #[tokio::test]
    async fn missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.json"));

        let out = source.load(&EventFilter::default()).await;
        assert!(out.is_degraded());
        assert!(out.value().is_empty());
    }

    #[tokio::test]
    async fn malformed_document_degrades_to_empty() {
        let file = write_events(r#"{"artist": "A"}"#);
        let source = FileSource::new(file.path());

        let out = source.load(&EventFilter::by_date("2025/01/01")).await;
        assert!(out.is_degraded());
        assert!(out.into_inner().is_empty());
    }

    #[tokio::test]
    async fn memory_source_keeps_source_order() {
        let events = vec![Event::new("B", "2025/01/02"), Event::new("A", "2025/01/01")];
        let source = MemorySource::new(events.clone());

        let out = source.load(&EventFilter::default()).await;
        assert_eq!(out, Outcome::Fresh(events));
    }

    #[test]
    fn remote_source_rejects_bad_url() {
        assert!(RemoteSource::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn builds_file_source_from_config() {
        let config = AppConfig {
            source: SourceConfig::File {
                path: PathBuf::from("/tmp/events.json"),
            },
            ..AppConfig::default()
        };
        let source = from_config(&config).unwrap();
        assert_eq!(source.describe(), "/tmp/events.json");
    }
}
