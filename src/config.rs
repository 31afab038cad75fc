use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::clock::Clock;
use crate::utils;

pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/yoshitaka-ishizu/livesearch/main/backend/data/events.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Remote { url: String },
    File { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Remote {
            url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub bind_addr: String,
    pub timezone: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            timezone: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Reads the config file (if any) and applies `LIVESEARCH_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LIVESEARCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| utils::config_path());
        let mut config = read_config(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LIVESEARCH_SOURCE_URL") {
            self.source = SourceConfig::Remote { url };
        }
        if let Some(path) = lookup("LIVESEARCH_SOURCE_FILE") {
            if let SourceConfig::Remote { url } = &self.source {
                if lookup("LIVESEARCH_SOURCE_URL").is_some() {
                    warn!("both LIVESEARCH_SOURCE_URL and LIVESEARCH_SOURCE_FILE set, ignoring {url}");
                }
            }
            self.source = SourceConfig::File {
                path: PathBuf::from(path),
            };
        }
        if let Some(bind) = lookup("LIVESEARCH_BIND") {
            self.bind_addr = bind;
        }
        if let Some(tz) = lookup("LIVESEARCH_TZ") {
            self.timezone = Some(tz);
        }
        if let Some(raw) = lookup("LIVESEARCH_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(
                    "ignoring LIVESEARCH_TIMEOUT_SECS={raw:?}, keeping {}s",
                    self.request_timeout_secs
                ),
            }
        }
    }

    /// Where a scrape run writes its document: the configured file source,
    /// or `events.json` in the data root when serving a remote document.
    pub fn scrape_output(&self) -> PathBuf {
        match &self.source {
            SourceConfig::File { path } => path.clone(),
            SourceConfig::Remote { .. } => utils::data_root().join("events.json"),
        }
    }

    pub fn clock(&self) -> Result<Clock, ConfigError> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(Clock::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Clock::Zone)
                .map_err(|err| ConfigError::Invalid(format!("timezone {name}: {err}"))),
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
