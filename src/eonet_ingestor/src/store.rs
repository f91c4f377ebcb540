//! Persisted event and occurrence tables.

pub mod first_occurrence;
pub mod merge;

use std::path::{Path, PathBuf};

use crate::{
    errors::StoreError,
    io::{read_table, write_table},
    models::{event::Event, occurrence::Occurrence},
};

pub use merge::{MergeOptions, MergeReport, merge_tables};

/// Both tables as held in memory between read and write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub events: Vec<Event>,
    pub occurrences: Vec<Occurrence>,
}

/// Locations of the two persisted tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStore {
    events_path: PathBuf,
    occurrences_path: PathBuf,
}

impl TableStore {
    pub fn new(events_path: impl Into<PathBuf>, occurrences_path: impl Into<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
            occurrences_path: occurrences_path.into(),
        }
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    pub fn occurrences_path(&self) -> &Path {
        &self.occurrences_path
    }

    /// Reads both tables. Missing files read as empty tables.
    ///
    /// Occurrence calendar parts are recomputed from the parsed date, so a
    /// date that no longer parses cannot leave stale year/month/day cells.
    pub fn load(&self) -> Result<Tables, StoreError> {
        let mut occurrences: Vec<Occurrence> = read_table(&self.occurrences_path)?;
        occurrences
            .iter_mut()
            .for_each(Occurrence::refresh_calendar_parts);
        Ok(Tables {
            occurrences,
            events: read_table(&self.events_path)?,
        })
    }

    /// Replaces both tables, occurrences first.
    pub fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        write_table(&self.occurrences_path, Occurrence::COLUMNS, &tables.occurrences)?;
        write_table(&self.events_path, Event::COLUMNS, &tables.events)
    }
}
