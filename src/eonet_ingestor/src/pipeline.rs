//! Sequences one ingestion run: fetch, flatten, clean, enrich, merge, persist.
//!
//! Only two failures stop a run: the fetch (nothing is written) and the
//! persisted tables (unreadable on merge, unwritable on persist). Everything
//! else degrades and is recorded as a [`Warning`] in the [`RunReport`].

pub mod report;
pub mod stage;

use std::{path::PathBuf, sync::Arc};

use tracing::{error, info, warn};

use crate::{
    errors::{PipelineError, StoreError, Warning},
    geo::{EnrichMode, EnrichOptions, ReverseGeocoder, enrich_occurrences},
    io::write_raw_archive,
    models::{date_range::DateRange, events_request::EventsRequest},
    providers::EventProvider,
    store::{
        MergeOptions, TableStore, Tables, first_occurrence::apply_first_occurrences,
        merge::retain_since, merge_tables,
    },
    transform::flatten_events,
};

pub use report::{BackfillReport, RunReport};
pub use stage::PipelineStage;

/// Request fields that do not change between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTemplate {
    pub status: Option<crate::models::events_request::EventStatus>,
    pub limit: Option<u32>,
    pub categories: Vec<String>,
}

impl RequestTemplate {
    pub fn for_range(&self, range: DateRange) -> EventsRequest {
        EventsRequest {
            range,
            status: self.status,
            limit: self.limit,
            categories: self.categories.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub request: RequestTemplate,
    pub merge: MergeOptions,
    pub enrich: EnrichOptions,
    pub raw_dir: Option<PathBuf>,
}

/// Records stage transitions and logs them.
struct StageTracker {
    visited: Vec<PipelineStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            visited: vec![PipelineStage::Idle],
        }
    }

    fn current(&self) -> PipelineStage {
        self.visited.last().copied().unwrap_or(PipelineStage::Idle)
    }

    fn advance(&mut self) -> PipelineStage {
        let next = self.current().next();
        info!(stage = %next, "Entering stage");
        self.visited.push(next);
        next
    }

    fn fail(&mut self, err: &PipelineError) {
        error!(stage = %err.stage(), error = %err, "Pipeline failed");
        self.visited.push(PipelineStage::Failed);
    }

    fn store_err(&self, source: StoreError) -> PipelineError {
        PipelineError::Store {
            stage: self.current(),
            source,
        }
    }
}

pub struct Pipeline {
    provider: Arc<dyn EventProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    store: TableStore,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn EventProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        store: TableStore,
        options: PipelineOptions,
    ) -> Self {
        Self {
            provider,
            geocoder,
            store,
            options,
        }
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Ingests `range` into the persisted tables.
    pub async fn run(&self, range: DateRange) -> Result<RunReport, PipelineError> {
        let mut tracker = StageTracker::new();
        info!(%range, "Starting ingestion run");
        match self.run_stages(range, &mut tracker).await {
            Ok(mut report) => {
                report.stages = tracker.visited;
                info!(
                    %range,
                    events = report.merge.events_out,
                    occurrences = report.merge.occurrences_out,
                    warnings = report.warnings.len(),
                    "Ingestion run complete"
                );
                Ok(report)
            }
            Err(err) => {
                tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        range: DateRange,
        tracker: &mut StageTracker,
    ) -> Result<RunReport, PipelineError> {
        tracker.advance(); // Extracting
        let request = self.options.request.for_range(range);
        let payload = self.provider.fetch_events(&request).await?;

        tracker.advance(); // Flattening
        let flat = flatten_events(&payload);
        let mut warnings = flat.warnings;
        let events_fetched = flat.events.len();
        let occurrences_flattened = flat.occurrences.len();
        let mut fresh = Tables {
            events: flat.events,
            occurrences: flat.occurrences,
        };

        tracker.advance(); // Cleaning
        let dropped_by_retention = retain_since(&mut fresh.occurrences, self.options.merge.cutoff);

        tracker.advance(); // Enriching
        let enrich = EnrichOptions {
            mode: EnrichMode::All,
            ..self.options.enrich.clone()
        };
        let enrichment = enrich_occurrences(&mut fresh.occurrences, self.geocoder.as_ref(), &enrich).await;
        if let Some(reason) = &enrichment.unavailable {
            warnings.push(Warning::EnrichmentUnavailable {
                reason: reason.clone(),
            });
        }

        tracker.advance(); // Merging
        let existing = self.store.load().map_err(|e| tracker.store_err(e))?;
        let (events, occurrences, merge) = merge_tables(
            (existing.events, existing.occurrences),
            (fresh.events, fresh.occurrences),
            &self.options.merge,
        );
        let merged = Tables { events, occurrences };

        tracker.advance(); // Persisting
        self.store.save(&merged).map_err(|e| tracker.store_err(e))?;
        let raw_archive = match &self.options.raw_dir {
            Some(dir) => Some(write_raw_archive(dir, &range, &payload).map_err(|e| tracker.store_err(e))?),
            None => None,
        };

        tracker.advance(); // Done
        for warning in &warnings {
            warn!(%warning, "Run completed with warning");
        }

        Ok(RunReport {
            range,
            stages: Vec::new(),
            events_fetched,
            occurrences_flattened,
            dropped_by_retention,
            enrichment,
            merge,
            raw_archive,
            warnings,
        })
    }

    /// Enriches persisted occurrences that still lack region and country,
    /// refreshes the events' first-occurrence fields and rewrites both tables.
    pub async fn backfill(&self) -> Result<BackfillReport, PipelineError> {
        let store_err = |stage, source| PipelineError::Store { stage, source };

        let mut tables = self
            .store
            .load()
            .map_err(|e| store_err(PipelineStage::Merging, e))?;

        let options = EnrichOptions {
            mode: EnrichMode::MissingOnly,
            ..self.options.enrich.clone()
        };
        let enrichment = enrich_occurrences(&mut tables.occurrences, self.geocoder.as_ref(), &options).await;
        let warnings: Vec<Warning> = enrichment
            .unavailable
            .iter()
            .map(|reason| Warning::EnrichmentUnavailable {
                reason: reason.clone(),
            })
            .collect();

        apply_first_occurrences(&mut tables.events, &tables.occurrences);
        self.store
            .save(&tables)
            .map_err(|e| store_err(PipelineStage::Persisting, e))?;

        info!(
            rows = enrichment.rows,
            resolved = enrichment.resolved_points,
            "Backfilled enrichment"
        );
        Ok(BackfillReport {
            enrichment,
            occurrences: tables.occurrences.len(),
            events: tables.events.len(),
            warnings,
        })
    }
}
