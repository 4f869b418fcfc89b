use anyhow::Context;
use chrono::TimeZone;

use crate::schema::{FlatEntry, HourlyRecord};

/// Turns the per-hour records into a plain list of plays with absolute times.
///
/// The date of each record is read from its key and taken at local midnight in `tz`.
/// Entries appear in the order of the records and their rows.
pub fn flatten<'r, Tz: TimeZone>(
    records: impl IntoIterator<Item = &'r HourlyRecord>,
    tz: &Tz,
) -> anyhow::Result<Vec<FlatEntry>> {
    let mut entries = vec![];
    for record in records {
        let date = record.key().date()?;
        let midnight = tz
            .from_local_datetime(&date.and_time(Default::default()))
            .earliest()
            .with_context(|| format!("Midnight of {date} does not exist in the time zone"))?
            .timestamp();
        entries.extend(record.rows().iter().map(|row| {
            FlatEntry::builder()
                .timestamp(midnight + i64::from(row.time().get()))
                .artist(row.artist().clone())
                .title(row.title().clone())
                .build()
        }));
    }
    Ok(entries)
}
