use anyhow::Context;
use chrono::{Datelike, NaiveDateTime, TimeZone};
use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::{
    schema::{FlatEntry, SongIdentity},
    time_of_day::TimeOfDay,
};

/// A local calendar day formatted as `MM/DD`.
#[derive(Clone, PartialEq, Eq, Hash, Debug, derive_more::Display, derive_more::AsRef)]
#[as_ref(forward)]
pub struct DayToken(String);
impl DayToken {
    fn of(local: &NaiveDateTime) -> Self {
        Self(format!("{:02}/{:02}", local.month(), local.day()))
    }
}

/// Dense indices of the days, in chronological order of their first play.
pub type DayIndex = IndexMap<DayToken, usize>;

#[derive(Clone, PartialEq, Eq, Debug, CopyGetters, Getters)]
pub struct PlayEvent {
    #[getset(get_copy = "pub")]
    timestamp: i64,
    #[getset(get_copy = "pub")]
    time_of_day: TimeOfDay,
    #[getset(get_copy = "pub")]
    day_index: usize,
    #[getset(get = "pub")]
    day: DayToken,
}
impl PlayEvent {
    /// The local time of the play as `HH:MM:SS`.
    pub fn clock(&self) -> String {
        self.time_of_day.to_string()
    }
}

/// Plays of each song, in the order the entries were given.
pub type OccurrenceList = IndexMap<SongIdentity, Vec<PlayEvent>>;

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct Aggregation {
    day_index: DayIndex,
    occurrences: OccurrenceList,
}

impl Aggregation {
    /// Songs by descending number of plays; songs with equal counts keep the order they were first seen in.
    pub fn ranked(&self) -> Vec<(&SongIdentity, &[PlayEvent])> {
        self.occurrences
            .iter()
            .map(|(song, events)| (song, events.as_slice()))
            .sorted_by_key(|(_, events)| std::cmp::Reverse(events.len()))
            .collect()
    }
}

pub fn aggregate<Tz: TimeZone>(entries: &[FlatEntry], tz: &Tz) -> anyhow::Result<Aggregation> {
    let local = |entry: &FlatEntry| {
        tz.timestamp_opt(entry.timestamp(), 0)
            .single()
            .map(|time| time.naive_local())
            .with_context(|| format!("Timestamp out of range: {}", entry.timestamp()))
    };

    let mut day_index = DayIndex::new();
    for entry in entries.iter().sorted_by_key(|entry| entry.timestamp()) {
        let day = DayToken::of(&local(entry)?);
        let next = day_index.len();
        day_index.entry(day).or_insert(next);
    }
    debug!("Days: {day_index:?}");

    let mut occurrences = OccurrenceList::new();
    for entry in entries {
        let time = local(entry)?;
        let day = DayToken::of(&time);
        let event = PlayEvent {
            timestamp: entry.timestamp(),
            time_of_day: time.time().into(),
            day_index: day_index[&day],
            day,
        };
        occurrences
            .entry(SongIdentity::new(entry.artist().clone(), entry.title().clone()))
            .or_default()
            .push(event);
    }

    Ok(Aggregation {
        day_index,
        occurrences,
    })
}
