use std::path::Path;

use log::info;
use playlist_scraping_utils::fs_json_util::{read_json, write_json_pretty};

use crate::schema::Snapshot;

/// Overwrites `path` with the snapshot, one record per requested hour in request order.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    write_json_pretty(path, snapshot)?;
    info!("Saved {} records to {path:?}.", snapshot.len());
    Ok(())
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let snapshot: Snapshot = read_json(path)?;
    info!("Successfully loaded {} records from {path:?}.", snapshot.len());
    Ok(snapshot)
}
