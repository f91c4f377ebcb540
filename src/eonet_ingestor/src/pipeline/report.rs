use std::{fmt, path::PathBuf};

use crate::{
    errors::Warning,
    geo::EnrichOutcome,
    models::date_range::DateRange,
    pipeline::stage::PipelineStage,
    store::MergeReport,
};

/// Outcome of a successful `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub range: DateRange,
    /// Every stage entered, in order, ending with `Done`.
    pub stages: Vec<PipelineStage>,
    pub events_fetched: usize,
    pub occurrences_flattened: usize,
    /// Fresh rows removed by the retention cutoff during cleaning.
    pub dropped_by_retention: usize,
    pub enrichment: EnrichOutcome,
    pub merge: MergeReport,
    pub raw_archive: Option<PathBuf>,
    pub warnings: Vec<Warning>,
}

impl RunReport {
    pub fn final_stage(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Idle)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} finished in stage {}", self.range, self.final_stage())?;
        writeln!(
            f,
            "fetched {} events, {} occurrences ({} before cutoff)",
            self.events_fetched, self.occurrences_flattened, self.dropped_by_retention
        )?;
        writeln!(
            f,
            "enriched {} rows over {} distinct points ({} resolved)",
            self.enrichment.rows, self.enrichment.distinct_points, self.enrichment.resolved_points
        )?;
        if let Some(path) = &self.raw_archive {
            writeln!(f, "raw payload archived to {}", path.display())?;
        }
        writeln!(f)?;
        write!(f, "{}", self.merge)?;
        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "{} warning(s):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  {warning}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of an `enrich` backfill over the persisted tables.
#[derive(Debug, Clone, PartialEq)]
pub struct BackfillReport {
    pub enrichment: EnrichOutcome,
    pub occurrences: usize,
    pub events: usize,
    pub warnings: Vec<Warning>,
}

impl fmt::Display for BackfillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "enriched {} of {} occurrences ({} distinct points, {} resolved); {} events rewritten",
            self.enrichment.rows,
            self.occurrences,
            self.enrichment.distinct_points,
            self.enrichment.resolved_points,
            self.events
        )?;
        for warning in &self.warnings {
            writeln!(f, "  {warning}")?;
        }
        Ok(())
    }
}
