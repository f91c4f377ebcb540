use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::{continent::Continent, date_range::parse_date};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ingest and enrich EONET natural-event records")]
pub struct Cli {
    /// Path to the config file (eonet.toml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch a date range and merge it into the persisted tables
    Run {
        /// First day to fetch (YYYY-MM-DD). Defaults to `lookback_days` before the end date
        #[arg(long, value_parser = parse_date)]
        start_date: Option<NaiveDate>,

        /// Last day to fetch (YYYY-MM-DD). Defaults to yesterday
        #[arg(long, value_parser = parse_date)]
        end_date: Option<NaiveDate>,
    },

    /// Geocode persisted occurrences that have no region or country yet
    Enrich,

    /// Print chart-ready aggregates of the persisted tables as JSON
    Summary {
        /// Restrict to one calendar year
        #[arg(long)]
        year: Option<i32>,

        /// Restrict occurrences to one continent (e.g. "North America")
        #[arg(long)]
        continent: Option<Continent>,
    },
}
