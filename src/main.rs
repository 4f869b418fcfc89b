use std::path::PathBuf;

use clap::Parser;
use playlist_scraping::{
    api::PlaylistClient, config::StationConfig, data_collector::fetch_all, store::save_snapshot,
};

#[derive(Parser)]
struct Opts {
    /// Where to write the scraped playlist.  An existing file is overwritten.
    output_file: PathBuf,
    /// TOML file describing the station.  Antenne AC is used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opts = Opts::parse();

    let config = StationConfig::load_or_default(opts.config.as_deref())?;
    let mut client = PlaylistClient::new(&config)?;
    let snapshot = fetch_all(&mut client, &config).await?;
    save_snapshot(&opts.output_file, &snapshot)?;

    Ok(())
}
