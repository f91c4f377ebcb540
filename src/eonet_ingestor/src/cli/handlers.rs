use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::{
    cli::commands::{Cli, Commands},
    config::Config,
    geo::{EnrichMode, GeoNamesGeocoder},
    models::{continent::Continent, date_range::DateRange},
    pipeline::{Pipeline, PipelineOptions, RequestTemplate},
    providers::eonet_rest::EonetProvider,
    store::TableStore,
    summary::{SummaryFilter, summarize},
};

pub fn table_store(config: &Config) -> TableStore {
    TableStore::new(config.storage.events_path(), config.storage.occurrences_path())
}

/// Wires the production provider, geocoder and store from `config`.
pub fn build_pipeline(config: &Config, today: NaiveDate) -> anyhow::Result<Pipeline> {
    let provider = EonetProvider::new(config.source.base_url.clone(), config.source.timeout())
        .context("failed to create EONET provider")?;
    let geocoder = GeoNamesGeocoder::new(config.geocoder.index_path.clone());
    let options = PipelineOptions {
        request: RequestTemplate {
            status: config.source.status,
            limit: config.source.limit,
            categories: config.source.categories.clone(),
        },
        merge: config.retention.merge_options(today),
        enrich: config.geocoder.enrich_options(EnrichMode::All),
        raw_dir: config.storage.raw_dir.clone(),
    };
    Ok(Pipeline::new(
        Arc::new(provider),
        Arc::new(geocoder),
        table_store(config),
        options,
    ))
}

pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Run {
            start_date,
            end_date,
        } => {
            let range = DateRange::resolve(start_date, end_date, today, config.range.lookback_days)?;
            let pipeline = build_pipeline(&config, today)?;
            let report = pipeline.run(range).await?;
            println!("{report}");
        }
        Commands::Enrich => {
            let pipeline = build_pipeline(&config, today)?;
            let report = pipeline.backfill().await?;
            println!("{report}");
        }
        Commands::Summary { year, continent } => {
            print_summary(&config, year, continent)?;
        }
    }
    Ok(())
}

fn print_summary(config: &Config, year: Option<i32>, continent: Option<Continent>) -> anyhow::Result<()> {
    let store = table_store(config);
    let tables = store
        .load()
        .with_context(|| format!("read tables under {}", config.storage.data_dir.display()))?;
    info!(
        events = tables.events.len(),
        occurrences = tables.occurrences.len(),
        "Loaded persisted tables"
    );
    let summary = summarize(&tables, SummaryFilter { year, continent });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
