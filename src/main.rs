use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use himalaya_elite::config::Config;
use himalaya_elite::data::loader::load_file;
use himalaya_elite::output::{export_records, write_json};
use himalaya_elite::report::Report;
use himalaya_elite::state::AppState;
use himalaya_elite::ui::render_text;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Clean a Himalayan expedition table and summarise risk, nationalities,
/// peaks, ascent stages, seasons and agencies.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Expedition table (.csv, .json or .parquet)
    file: PathBuf,

    /// TOML file overriding the analysis defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// First year of the period (inclusive)
    #[arg(long)]
    from: Option<i32>,

    /// Last year of the period (inclusive)
    #[arg(long)]
    to: Option<i32>,

    /// Restrict the season and agency views to one peak
    #[arg(long)]
    peak: Option<String>,

    /// Peak shown in the ascent pyramid
    #[arg(long)]
    funnel_peak: Option<String>,

    /// Minimum expeditions for an agency to be ranked
    #[arg(long)]
    min_expeditions: Option<u64>,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Also write the normalized records to this CSV file
    #[arg(long)]
    export_records: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(n) = cli.min_expeditions {
        config.agency_min_expeditions = n;
    }

    let source = load_file(&cli.file)?;
    let mut state = AppState::new(config);
    state.load_source(&source);

    if (cli.from.is_some() || cli.to.is_some()) && !state.set_year_bounds(cli.from, cli.to) {
        bail!("{} has no usable records", cli.file.display());
    }
    if cli.peak.is_some() {
        state.set_peak(cli.peak.clone());
    }
    if let Some(peak) = &cli.funnel_peak {
        state.set_funnel_peak(peak);
    }
    if let Some(msg) = &state.status_message {
        log::warn!("{msg}");
    }

    if let (Some(path), Some(batch)) = (&cli.export_records, state.full_batch()) {
        export_records(path, &batch.records)?;
    }

    let Some(report) = Report::build(&state) else {
        bail!("no dataset loaded from {}", cli.file.display());
    };
    match cli.format {
        Format::Text => print!("{}", render_text(&report)?),
        Format::Json => {
            write_json(io::stdout().lock(), &report)?;
            println!();
        }
    }
    Ok(())
}
