use std::{path::Path, time::Duration};

use log::info;
use playlist_scraping_utils::fs_json_util::read_toml;
use serde::Deserialize;
use url::Url;

use crate::parser::playlist::DEFAULT_ROW_CLASSES;

pub const DEFAULT_STATION_NAME: &str = "AntenneAC";
pub const DEFAULT_PLAYLIST_URL: &str = "http://www.antenne-ac.de/musik/playlist/";

/// Where and how to read the playlist archive of a station.
///
/// Every key is optional in the TOML file; missing keys fall back to Antenne AC.
///
/// ```toml
/// name = "AntenneAC"
/// playlist_url = "http://www.antenne-ac.de/musik/playlist/"
/// day_field = "pl_day"
/// hour_field = "pl_hour"
/// row_classes = ["bg1", "bg2"]
/// request_interval_ms = 0
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    pub name: String,
    pub playlist_url: Url,
    pub day_field: String,
    pub hour_field: String,
    pub row_classes: Vec<String>,
    pub request_interval_ms: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STATION_NAME.to_owned(),
            playlist_url: Url::parse(DEFAULT_PLAYLIST_URL).unwrap(),
            day_field: "pl_day".to_owned(),
            hour_field: "pl_hour".to_owned(),
            row_classes: DEFAULT_ROW_CLASSES.map(str::to_owned).to_vec(),
            request_interval_ms: 0,
        }
    }
}

impl StationConfig {
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let config = read_toml(path)?;
                info!("Loaded station configuration from {path:?}.");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}
