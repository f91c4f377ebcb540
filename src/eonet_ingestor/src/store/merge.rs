//! Incremental merge of freshly flattened rows into the persisted tables.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
    ops::RangeInclusive,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    models::{event::Event, occurrence::Occurrence},
    store::first_occurrence::apply_first_occurrences,
};

/// Knobs of one merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOptions {
    /// Rows dated before this are dropped. Undated rows are always kept.
    pub cutoff: Option<DateTime<Utc>>,
    /// Also apply `cutoff` to rows that were already persisted.
    pub prune_persisted: bool,
    /// Keep only rows whose year falls in this window. Undated rows are dropped.
    pub years: Option<RangeInclusive<i32>>,
    /// Drop events that end up without a first-occurrence date.
    pub drop_events_without_occurrences: bool,
}

/// Row counts of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub existing_rows: usize,
    pub new_rows: usize,
    pub dropped_new_by_retention: usize,
    pub dropped_existing_by_retention: usize,
    pub replaced_by_key: usize,
    pub dropped_by_year_window: usize,
    pub exact_duplicates: usize,
    pub occurrences_out: usize,
    pub existing_events: usize,
    pub new_events: usize,
    pub events_without_occurrences: usize,
    pub events_out: usize,
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, lines: &[(&str, usize)]) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(title.len()))?;
    for (label, count) in lines {
        writeln!(f, "{label:<28}{count:>8}")?;
    }
    Ok(())
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(
            f,
            "Occurrences",
            &[
                ("persisted", self.existing_rows),
                ("fetched", self.new_rows),
                ("- before cutoff (fetched)", self.dropped_new_by_retention),
                ("- before cutoff (persisted)", self.dropped_existing_by_retention),
                ("- replaced by newer copy", self.replaced_by_key),
                ("- outside year window", self.dropped_by_year_window),
                ("- exact duplicates", self.exact_duplicates),
                ("= written", self.occurrences_out),
            ],
        )?;
        writeln!(f)?;
        write_section(
            f,
            "Events",
            &[
                ("persisted", self.existing_events),
                ("fetched", self.new_events),
                ("- without occurrences", self.events_without_occurrences),
                ("= written", self.events_out),
            ],
        )
    }
}

/// Keeps rows dated on or after `cutoff` and undated rows. Returns how many were dropped.
pub fn retain_since(rows: &mut Vec<Occurrence>, cutoff: Option<DateTime<Utc>>) -> usize {
    let Some(cutoff) = cutoff else {
        return 0;
    };
    let before = rows.len();
    rows.retain(|row| row.date.is_none_or(|d| d >= cutoff));
    before - rows.len()
}

/// Keeps the last row of every key, each at its own position. Returns the number removed.
fn keep_last_by<T, K, F>(rows: Vec<T>, key: F) -> (Vec<T>, usize)
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut last: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        last.insert(key(row), i);
    }
    let keep: HashSet<usize> = last.into_values().collect();
    let before = rows.len();
    let kept: Vec<T> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| keep.contains(&i).then_some(row))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

fn dedup_exact(rows: Vec<Occurrence>) -> (Vec<Occurrence>, usize) {
    let mut seen = HashSet::with_capacity(rows.len());
    let before = rows.len();
    let kept: Vec<Occurrence> = rows
        .into_iter()
        .filter(|row| seen.insert(row.fingerprint()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Merges fresh occurrences into the persisted ones.
///
/// Fresh rows go through the retention cutoff, are appended after the
/// persisted rows and win every `(event_id, date)` collision. The year window
/// and exact-duplicate removal run last.
pub fn merge_occurrences(
    existing: Vec<Occurrence>,
    mut fresh: Vec<Occurrence>,
    options: &MergeOptions,
    report: &mut MergeReport,
) -> Vec<Occurrence> {
    report.existing_rows = existing.len();
    report.new_rows = fresh.len();
    report.dropped_new_by_retention = retain_since(&mut fresh, options.cutoff);

    let mut combined = existing;
    if options.prune_persisted {
        report.dropped_existing_by_retention = retain_since(&mut combined, options.cutoff);
    }
    combined.extend(fresh);

    let (mut combined, replaced) = keep_last_by(combined, Occurrence::key);
    report.replaced_by_key = replaced;

    if let Some(years) = &options.years {
        let before = combined.len();
        combined.retain(|row| row.year.is_some_and(|y| years.contains(&y)));
        report.dropped_by_year_window = before - combined.len();
    }

    let (combined, exact) = dedup_exact(combined);
    report.exact_duplicates = exact;
    report.occurrences_out = combined.len();
    combined
}

/// Merges fresh event rows into the persisted ones and re-derives their
/// first-occurrence fields from the merged `occurrences`.
pub fn merge_events(
    existing: Vec<Event>,
    fresh: Vec<Event>,
    occurrences: &[Occurrence],
    options: &MergeOptions,
    report: &mut MergeReport,
) -> Vec<Event> {
    report.existing_events = existing.len();
    report.new_events = fresh.len();

    let mut events = existing;
    events.extend(fresh);
    let (mut events, _) = keep_last_by(events, |e: &Event| e.event_id.clone());

    apply_first_occurrences(&mut events, occurrences);

    let without = events.iter().filter(|e| e.date.is_none()).count();
    report.events_without_occurrences = without;
    if options.drop_events_without_occurrences {
        events.retain(|e| e.date.is_some());
    }
    report.events_out = events.len();
    events
}

/// Merges both tables at once and logs the outcome.
pub fn merge_tables(
    existing: (Vec<Event>, Vec<Occurrence>),
    fresh: (Vec<Event>, Vec<Occurrence>),
    options: &MergeOptions,
) -> (Vec<Event>, Vec<Occurrence>, MergeReport) {
    let mut report = MergeReport::default();
    let occurrences = merge_occurrences(existing.1, fresh.1, options, &mut report);
    let events = merge_events(existing.0, fresh.0, &occurrences, options, &mut report);
    info!(
        occurrences = report.occurrences_out,
        events = report.events_out,
        replaced = report.replaced_by_key,
        "Merged tables"
    );
    (events, occurrences, report)
}
