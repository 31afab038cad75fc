pub mod clock;
pub mod config;
pub mod models;
pub mod outcome;
pub mod query;
pub mod scraping;
pub mod server;
pub mod source;
pub mod utils;

pub use clock::Clock;
pub use config::{AppConfig, SourceConfig};
pub use models::{ArtistStatus, Event, EventFilter};
pub use outcome::Outcome;
pub use query::EventQueryService;
pub use source::{EventSource, FileSource, MemorySource, RemoteSource, SourceError};
