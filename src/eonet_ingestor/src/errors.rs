use std::path::PathBuf;

use thiserror::Error;

use crate::{pipeline::stage::PipelineStage, providers::ProviderError};

/// A fatal pipeline failure, tagged with the stage it happened in.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetching the payload failed. Nothing was persisted.
    #[error("Extracting stage failed: {0}")]
    Extraction(#[from] ProviderError),

    /// Reading or writing a persisted table failed.
    #[error("{stage} stage failed: {source}")]
    Store {
        stage: PipelineStage,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    /// The stage the run was in when it failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Extraction(_) => PipelineStage::Extracting,
            PipelineError::Store { stage, .. } => *stage,
        }
    }
}

/// Errors from the on-disk table store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted table exists but is not a valid table.
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize a row for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The finished temp file could not be moved over the target.
    #[error("Failed to replace {}: {source}", path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A non-fatal degradation recorded during a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    /// A record or field had an unexpected shape and was defaulted or skipped.
    #[error("Malformed record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// A date string could not be parsed and was stored as null.
    #[error("Unparsable {field} {value:?} on {event_id}; stored as null")]
    Parse {
        event_id: String,
        field: &'static str,
        value: String,
    },

    /// Reverse geocoding failed; region and country were left null.
    #[error("Enrichment unavailable: {reason}")]
    EnrichmentUnavailable { reason: String },
}
