use std::path::PathBuf;

use anyhow::Context;
use chrono::{FixedOffset, Local, TimeZone};
use clap::Parser;
use log::info;
use playlist_scraping::{
    chart::{render_most_played, save_chart},
    config::StationConfig,
    flatten::flatten,
    occurrence::aggregate,
    store::load_snapshot,
};

#[derive(Parser)]
struct Opts {
    input_file: PathBuf,
    output_file: PathBuf,
    /// Number of songs to show.
    #[arg(long, default_value_t = 5)]
    top: usize,
    /// Hours east of UTC to interpret the playlist in.  Defaults to the local time zone.
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    match opts.utc_offset {
        Some(hours) => {
            let tz = FixedOffset::east_opt(hours * 3600)
                .with_context(|| format!("UTC offset out of range: {hours}"))?;
            run(&opts, &tz)
        }
        None => run(&opts, &Local),
    }
}

fn run<Tz: TimeZone>(opts: &Opts, tz: &Tz) -> anyhow::Result<()> {
    let config = StationConfig::load_or_default(opts.config.as_deref())?;
    let snapshot = load_snapshot(&opts.input_file)?;
    let entries = flatten(&snapshot, tz)?;
    info!("{} plays in total", entries.len());
    let aggregation = aggregate(&entries, tz)?;

    for (rank, (song, events)) in aggregation.ranked().into_iter().take(opts.top).enumerate() {
        println!("{:>2}. {song} ({} plays)", rank + 1, events.len());
        for event in events {
            println!("      {} {}", event.day(), event.clock());
        }
    }

    let document = render_most_played(&aggregation, opts.top, &config.name);
    save_chart(&opts.output_file, &document)?;
    info!("Chart written to {:?}", opts.output_file);

    Ok(())
}
