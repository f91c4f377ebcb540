//! Runtime configuration: TOML file, defaults and environment overrides.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]
//! - File-or-defaults plus environment overrides: [`Config::load`]
//!
//! Environment overrides (applied after the file):
//! - `EONET_BASE_URL` replaces `source.base_url`
//! - `EONET_DATA_DIR` replaces `storage.data_dir`
//! - `EONET_GEOCODER_INDEX` replaces `geocoder.index_path`
//! - `EONET_LOOKBACK_DAYS` replaces `range.lookback_days`

use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, bail, ensure};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_utils::env::{env_override, parse_env_override};
use toml::from_str;

use crate::{
    geo::{EnrichMode, EnrichOptions},
    models::{events_request::EventStatus, timestamp::start_of_day},
    providers::eonet_rest::provider::DEFAULT_BASE_URL,
    store::MergeOptions,
};

pub const DEFAULT_RETENTION_DAYS: u32 = 1825;
/// Upper bound for `range.lookback_days` (roughly a century).
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub retention: RetentionConfig,
    pub geocoder: GeocoderConfig,
    pub range: RangeConfig,
}

/// Where events are fetched from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub base_url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub status: Option<EventStatus>,
    pub limit: Option<u32>,
    /// Category ids to restrict the pull to. Empty means all.
    pub categories: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            status: None,
            limit: None,
            categories: Vec::new(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub events_file: String,
    pub occurrences_file: String,
    /// When set, each pull's raw payload is archived here.
    pub raw_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/processed"),
            events_file: "events.csv".to_string(),
            occurrences_file: "occurrences.csv".to_string(),
            raw_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(&self.events_file)
    }

    pub fn occurrences_path(&self) -> PathBuf {
        self.data_dir.join(&self.occurrences_file)
    }
}

/// Which rows the persisted tables keep.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    /// Rows older than this many days are dropped. `0` disables the cutoff.
    pub days: u32,
    /// Fixed cutoff date (`"YYYY-MM-DD"`); takes precedence over `days`.
    pub cutoff: Option<NaiveDate>,
    /// Keep only the current and previous `n - 1` calendar years.
    pub keep_recent_years: Option<u32>,
    /// Apply the cutoff to already persisted rows as well.
    pub prune_persisted: bool,
    pub drop_events_without_occurrences: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_RETENTION_DAYS,
            cutoff: None,
            keep_recent_years: None,
            prune_persisted: true,
            drop_events_without_occurrences: false,
        }
    }
}

impl RetentionConfig {
    /// Earliest instant a dated row may carry, relative to `today`.
    pub fn cutoff(&self, today: NaiveDate) -> Option<DateTime<Utc>> {
        if let Some(date) = self.cutoff {
            return Some(start_of_day(date));
        }
        if self.days == 0 {
            return None;
        }
        today
            .checked_sub_days(Days::new(u64::from(self.days)))
            .map(start_of_day)
    }

    pub fn year_window(&self, today: NaiveDate) -> Option<RangeInclusive<i32>> {
        let years = self.keep_recent_years.filter(|n| *n > 0)?;
        let current = today.year();
        let span = i32::try_from(years).unwrap_or(i32::MAX).saturating_sub(1);
        Some(current.saturating_sub(span)..=current)
    }

    pub fn merge_options(&self, today: NaiveDate) -> MergeOptions {
        MergeOptions {
            cutoff: self.cutoff(today),
            prune_persisted: self.prune_persisted,
            years: self.year_window(today),
            drop_events_without_occurrences: self.drop_events_without_occurrences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeocoderConfig {
    /// GeoNames-style CSV (`lat,lon,name,admin1,admin2,cc`).
    pub index_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("data/geonames/cities1000.csv"),
            timeout_secs: 60,
        }
    }
}

impl GeocoderConfig {
    pub fn enrich_options(&self, mode: EnrichMode) -> EnrichOptions {
        EnrichOptions {
            mode,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Default date range of `run` when no dates are given.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RangeConfig {
    pub lookback_days: u32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self { lookback_days: 1 }
    }
}

impl Config {
    /// Loads `path` if given (defaults otherwise) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => load_config_path(path)?,
            None => Config::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Some(url) = env_override("EONET_BASE_URL") {
            self.source.base_url = url;
        }
        if let Some(dir) = env_override("EONET_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(index) = env_override("EONET_GEOCODER_INDEX") {
            self.geocoder.index_path = PathBuf::from(index);
        }
        if let Some(days) = parse_env_override::<u32>("EONET_LOOKBACK_DAYS")? {
            self.range.lookback_days = days;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.source.base_url.trim().is_empty(), "source.base_url must not be empty");
        ensure!(self.source.timeout_secs > 0, "source.timeout_secs must be positive");
        ensure!(self.geocoder.timeout_secs > 0, "geocoder.timeout_secs must be positive");
        ensure!(
            self.range.lookback_days <= MAX_LOOKBACK_DAYS,
            "range.lookback_days must be at most {MAX_LOOKBACK_DAYS}, got {}",
            self.range.lookback_days
        );
        if self.storage.events_file == self.storage.occurrences_file {
            bail!(
                "storage.events_file and storage.occurrences_file must differ (both {:?})",
                self.storage.events_file
            );
        }
        Ok(())
    }
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<Config> {
    let config: Config = from_str(toml_str).context("failed to parse config TOML")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Read a configuration file from disk, parse, and validate it.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
