//! Board Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};
use crate::models::SortDirection;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const DEFAULT_LIVE_CHANNEL: &str = "tasks";

/// Runtime settings for the board engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Task API root, without trailing slash
    pub api_base_url: String,
    pub search_debounce_ms: u64,
    /// Channel carrying `task.*` events
    pub live_channel: String,
    /// Sort parameter sent with `GET /tasks`
    pub fetch_sort: SortDirection,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            live_channel: DEFAULT_LIVE_CHANNEL.to_string(),
            fetch_sort: SortDirection::Asc,
        }
    }
}

impl BoardConfig {
    pub fn from_json(raw: &str) -> BoardResult<Self> {
        let mut config: BoardConfig = serde_json::from_str(raw)
            .map_err(|e| BoardError::Config(e.to_string()))?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Default config pointed at another API root
    pub fn with_api_base_url(url: &str) -> Self {
        Self {
            api_base_url: url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Pick the config from build-time settings
    ///
    /// A full JSON config wins over a bare API root; neither means defaults.
    /// Blank values count as unset.
    pub fn resolve(json: Option<&str>, api_base_url: Option<&str>) -> BoardResult<Self> {
        let json = json.map(str::trim).filter(|raw| !raw.is_empty());
        let api_base_url = api_base_url.map(str::trim).filter(|url| !url.is_empty());
        match (json, api_base_url) {
            (Some(raw), _) => Self::from_json(raw),
            (None, Some(url)) => Ok(Self::with_api_base_url(url)),
            (None, None) => Ok(Self::default()),
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
