use std::collections::BTreeMap;

use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use playlist_scraping_utils::regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::time_of_day::TimeOfDay;

/// One line of an hour page: the physical column order is time, title, artist.
#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, CopyGetters, Getters, Serialize, Deserialize)]
#[serde(
    from = "(TimeOfDay, String, String)",
    into = "(TimeOfDay, String, String)"
)]
pub struct RawRow {
    #[getset(get_copy = "pub")]
    time: TimeOfDay,
    #[getset(get = "pub")]
    #[builder(setter(into))]
    title: String,
    #[getset(get = "pub")]
    #[builder(setter(into))]
    artist: String,
}
impl From<(TimeOfDay, String, String)> for RawRow {
    fn from((time, title, artist): (TimeOfDay, String, String)) -> Self {
        Self {
            time,
            title,
            artist,
        }
    }
}
impl From<RawRow> for (TimeOfDay, String, String) {
    fn from(row: RawRow) -> Self {
        (row.time, row.title, row.artist)
    }
}

/// `<day>-<hour>` as published by the station, e.g. `2023-05-01-14`.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    derive_more::From,
    derive_more::AsRef,
    derive_more::Display,
    Serialize,
    Deserialize,
)]
#[as_ref(forward)]
pub struct HourKey(String);

#[derive(PartialEq, Eq, Debug, Error)]
pub enum HourKeyError {
    #[error("Hour key {0:?} does not start with a YYYY-MM-DD date")]
    NoDate(String),
    #[error("Hour key {0:?} starts with an invalid date")]
    InvalidDate(String),
}

impl HourKey {
    pub fn new(day: &str, hour: &str) -> Self {
        Self(format!("{day}-{hour}"))
    }

    /// The date encoded in the first ten characters of the key.
    pub fn date(&self) -> Result<NaiveDate, HourKeyError> {
        let prefix = regex!(r"^\d{4}-\d{2}-\d{2}")
            .find(&self.0)
            .ok_or_else(|| HourKeyError::NoDate(self.0.clone()))?;
        NaiveDate::parse_from_str(prefix.as_str(), "%Y-%m-%d")
            .map_err(|_| HourKeyError::InvalidDate(self.0.clone()))
    }
}

/// The result of a single (day, hour) request.
///
/// Serialized as an object with exactly one entry, `{"<day>-<hour>": [[seconds, title, artist], ...]}`.
#[derive(Clone, PartialEq, Eq, Debug, Getters, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<HourKey, Vec<RawRow>>",
    into = "BTreeMap<HourKey, Vec<RawRow>>"
)]
#[getset(get = "pub")]
pub struct HourlyRecord {
    key: HourKey,
    rows: Vec<RawRow>,
}

#[derive(Debug, Error)]
#[error("An hourly record must consist of exactly one key, but found {0}")]
pub struct HourlyRecordShapeError(usize);

impl HourlyRecord {
    pub fn new(key: HourKey, rows: Vec<RawRow>) -> Self {
        Self { key, rows }
    }
}
impl TryFrom<BTreeMap<HourKey, Vec<RawRow>>> for HourlyRecord {
    type Error = HourlyRecordShapeError;
    fn try_from(map: BTreeMap<HourKey, Vec<RawRow>>) -> Result<Self, Self::Error> {
        let len = map.len();
        match map.into_iter().next() {
            Some((key, rows)) if len == 1 => Ok(Self { key, rows }),
            _ => Err(HourlyRecordShapeError(len)),
        }
    }
}
impl From<HourlyRecord> for BTreeMap<HourKey, Vec<RawRow>> {
    fn from(record: HourlyRecord) -> Self {
        BTreeMap::from([(record.key, record.rows)])
    }
}

/// The whole scrape, one record per requested hour in request order.
pub type Snapshot = Vec<HourlyRecord>;

/// A play with its absolute time.
#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, CopyGetters, Getters)]
pub struct FlatEntry {
    /// Unix time in seconds.
    #[getset(get_copy = "pub")]
    timestamp: i64,
    #[getset(get = "pub")]
    #[builder(setter(into))]
    artist: String,
    #[getset(get = "pub")]
    #[builder(setter(into))]
    title: String,
}

/// Songs are told apart by exact, case-sensitive artist and title.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Getters)]
#[getset(get = "pub")]
pub struct SongIdentity {
    artist: String,
    title: String,
}
impl SongIdentity {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}
impl std::fmt::Display for SongIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}
