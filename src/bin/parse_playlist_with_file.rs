use std::path::PathBuf;

use clap::Parser;
use playlist_scraping::parser::playlist::{escape_ampersands, extract_playlist_rows};

#[derive(Parser)]
struct Opts {
    input_file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let markup = fs_err::read_to_string(opts.input_file)?;

    let rows = extract_playlist_rows(&escape_ampersands(&markup))?;
    for row in &rows {
        println!("{}\t{}\t{}", row.time(), row.title(), row.artist());
    }
    println!("{}", serde_json::to_string_pretty(&rows)?);

    Ok(())
}
