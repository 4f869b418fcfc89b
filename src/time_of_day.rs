use std::fmt::Display;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Seconds elapsed since midnight, always less than [`SECONDS_PER_DAY`].
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct TimeOfDay(u32);

#[derive(PartialEq, Eq, Debug, Error)]
pub enum TimeOfDayParseError {
    #[error("{0:?} is not a time of the form HH:MM:SS")]
    BadFormat(String),
    #[error("Seconds of day out of range: {0}")]
    OutOfRange(u32),
    #[error("{hour}:{minute}:{second} is not a time of day")]
    InvalidHms { hour: u32, minute: u32, second: u32 },
}

impl TimeOfDay {
    pub fn get(self) -> u32 {
        self.0
    }

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, TimeOfDayParseError> {
        if hour >= 24 || minute >= 60 || second >= 60 {
            return Err(TimeOfDayParseError::InvalidHms {
                hour,
                minute,
                second,
            });
        }
        Ok(Self(hour * 3600 + minute * 60 + second))
    }

    pub fn hms(self) -> (u32, u32, u32) {
        (self.0 / 3600, self.0 / 60 % 60, self.0 % 60)
    }

    pub fn hours_f64(self) -> f64 {
        self.0 as f64 / 3600.
    }

    /// Parses `HH:MM:SS`; one-digit fields are accepted as well.
    pub fn parse_hms(text: &str) -> Result<Self, TimeOfDayParseError> {
        let time = NaiveTime::parse_from_str(text, "%H:%M:%S")
            .map_err(|_| TimeOfDayParseError::BadFormat(text.to_owned()))?;
        Self::from_hms(time.hour(), time.minute(), time.second())
    }
}

impl TryFrom<u32> for TimeOfDay {
    type Error = TimeOfDayParseError;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        if v < SECONDS_PER_DAY {
            Ok(Self(v))
        } else {
            Err(TimeOfDayParseError::OutOfRange(v))
        }
    }
}

impl From<TimeOfDay> for u32 {
    fn from(v: TimeOfDay) -> Self {
        v.0
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self(time.num_seconds_from_midnight())
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h, m, s) = self.hms();
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}
