//! Chart-ready aggregates of the persisted tables.
//!
//! Consumers (dashboards, the `summary` command) read these instead of the
//! raw tables: daily occurrence counts, the most recent day's count, event
//! counts per category and the points to place on a map.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    models::{continent::Continent, event::Event, occurrence::Occurrence},
    store::Tables,
};

/// Year/continent selection. `None` means no restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SummaryFilter {
    pub year: Option<i32>,
    pub continent: Option<Continent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category_title: String,
    pub event_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub event_id: String,
    pub event_title: String,
    pub category_titles: String,
    pub date: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    pub region: Option<String>,
    pub country: Option<String>,
    pub continent: Option<Continent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub filter: SummaryFilter,
    /// Years present in the occurrence table, newest first.
    pub available_years: Vec<i32>,
    pub available_continents: Vec<Continent>,
    pub occurrences: usize,
    pub events: usize,
    pub daily: Vec<DailyCount>,
    /// Occurrences on the most recent day that has any.
    pub latest_day: Option<DailyCount>,
    pub categories: Vec<CategoryCount>,
    pub map: Vec<MapPoint>,
}

pub fn available_years(occurrences: &[Occurrence]) -> Vec<i32> {
    let years: BTreeSet<i32> = occurrences.iter().filter_map(|o| o.year).collect();
    years.into_iter().rev().collect()
}

pub fn available_continents(occurrences: &[Occurrence]) -> Vec<Continent> {
    let continents: BTreeSet<Continent> = occurrences.iter().filter_map(|o| o.continent).collect();
    continents.into_iter().collect()
}

/// Applies `filter`. Occurrences are matched on year and continent. Events
/// are matched on their own year when the table carries any, otherwise on
/// having an occurrence in the filtered set; continent does not apply to them.
pub fn filter_tables<'a>(
    tables: &'a Tables,
    filter: &SummaryFilter,
) -> (Vec<&'a Occurrence>, Vec<&'a Event>) {
    let occurrences: Vec<&Occurrence> = tables
        .occurrences
        .iter()
        .filter(|o| filter.year.is_none_or(|y| o.year == Some(y)))
        .filter(|o| filter.continent.is_none_or(|c| o.continent == Some(c)))
        .collect();

    let events: Vec<&Event> = match filter.year {
        None => tables.events.iter().collect(),
        Some(year) if tables.events.iter().any(|e| e.year.is_some()) => tables
            .events
            .iter()
            .filter(|e| e.year == Some(year))
            .collect(),
        Some(_) => {
            let ids: HashSet<&str> = occurrences.iter().map(|o| o.event_id.as_str()).collect();
            tables
                .events
                .iter()
                .filter(|e| ids.contains(e.event_id.as_str()))
                .collect()
        }
    };
    (occurrences, events)
}

/// Occurrences per calendar day (UTC), oldest first. Undated rows are ignored.
pub fn daily_counts(occurrences: &[&Occurrence]) -> Vec<DailyCount> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in occurrences.iter().filter_map(|o| o.date) {
        *days.entry(date.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

pub fn latest_day(occurrences: &[&Occurrence]) -> Option<DailyCount> {
    daily_counts(occurrences).pop()
}

/// Distinct events per category title, largest first.
///
/// Uses the events' category lists; falls back to the joined
/// `category_titles` column when no event carries a list.
pub fn category_counts(events: &[&Event]) -> Vec<CategoryCount> {
    let mut by_title: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    let has_lists = events.iter().any(|e| !e.categories.is_empty());
    for event in events {
        if has_lists {
            for title in &event.categories {
                by_title
                    .entry(title.as_str())
                    .or_default()
                    .insert(event.event_id.as_str());
            }
        } else if let Some(titles) = event.category_titles.as_deref() {
            by_title
                .entry(titles)
                .or_default()
                .insert(event.event_id.as_str());
        }
    }

    let mut counts: Vec<CategoryCount> = by_title
        .into_iter()
        .map(|(title, ids)| CategoryCount {
            category_title: title.to_string(),
            event_count: ids.len(),
        })
        .collect();
    counts.sort_by(|a, b| {
        b.event_count
            .cmp(&a.event_count)
            .then_with(|| a.category_title.cmp(&b.category_title))
    });
    counts
}

pub fn map_points(occurrences: &[&Occurrence]) -> Vec<MapPoint> {
    occurrences
        .iter()
        .filter_map(|o| {
            let coord = o.coordinate()?;
            Some(MapPoint {
                event_id: o.event_id.clone(),
                event_title: o.event_title.clone(),
                category_titles: o.category_titles.clone(),
                date: o.date,
                latitude: coord.latitude,
                longitude: coord.longitude,
                region: o.region.clone(),
                country: o.country.clone(),
                continent: o.continent,
            })
        })
        .collect()
}

pub fn summarize(tables: &Tables, filter: SummaryFilter) -> Summary {
    let (occurrences, events) = filter_tables(tables, &filter);
    Summary {
        filter,
        available_years: available_years(&tables.occurrences),
        available_continents: available_continents(&tables.occurrences),
        occurrences: occurrences.len(),
        events: events.len(),
        daily: daily_counts(&occurrences),
        latest_day: latest_day(&occurrences),
        categories: category_counts(&events),
        map: map_points(&occurrences),
    }
}
