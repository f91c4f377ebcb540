//! One dated, geolocated observation of an event.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{continent::Continent, coordinate::Coordinate, timestamp::opt_timestamp};

/// Flat occurrence row, as persisted in `occurrences.csv`.
///
/// Category ids/titles are comma-joined strings here; charting consumes them as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub event_id: String,
    #[serde(default)]
    pub event_title: String,
    #[serde(default)]
    pub category_ids: String,
    #[serde(default)]
    pub category_titles: String,
    #[serde(default, with = "opt_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub occurrence_type: Option<String>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub continent: Option<Continent>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

/// Identity of an occurrence row.
pub type OccurrenceKey = (String, Option<DateTime<Utc>>);

/// Geographic enrichment applied to a row in one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub region: Option<String>,
    pub country: Option<String>,
    pub continent: Option<Continent>,
}

impl Occurrence {
    /// Column order of the persisted table; matches the field order above.
    pub const COLUMNS: &'static [&'static str] = &[
        "event_id",
        "event_title",
        "category_ids",
        "category_titles",
        "date",
        "occurrence_type",
        "longitude",
        "latitude",
        "region",
        "country",
        "continent",
        "year",
        "month",
        "day",
    ];

    /// A row carrying only event identity; date, type, coordinates and enrichment are null.
    pub fn bare(
        event_id: impl Into<String>,
        event_title: impl Into<String>,
        category_ids: impl Into<String>,
        category_titles: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_title: event_title.into(),
            category_ids: category_ids.into(),
            category_titles: category_titles.into(),
            date: None,
            occurrence_type: None,
            longitude: None,
            latitude: None,
            region: None,
            country: None,
            continent: None,
            year: None,
            month: None,
            day: None,
        }
    }

    /// Sets the observation date and recomputes year/month/day.
    pub fn set_date(&mut self, date: Option<DateTime<Utc>>) {
        self.date = date;
        self.refresh_calendar_parts();
    }

    /// Recomputes year/month/day from `date`.
    pub fn refresh_calendar_parts(&mut self) {
        self.year = self.date.map(|d| d.year());
        self.month = self.date.map(|d| d.month());
        self.day = self.date.map(|d| d.day());
    }

    pub fn key(&self) -> OccurrenceKey {
        (self.event_id.clone(), self.date)
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }

    pub fn apply_enrichment(&mut self, enrichment: Enrichment) {
        let Enrichment {
            region,
            country,
            continent,
        } = enrichment;
        self.region = region;
        self.country = country;
        self.continent = continent;
    }

    /// True when the row has a valid coordinate pair but no geocoded fields yet.
    pub fn needs_enrichment(&self) -> bool {
        self.coordinate().is_some() && self.region.is_none() && self.country.is_none()
    }

    /// True for the stand-in row of an event that had no geometry at all.
    pub fn is_placeholder(&self) -> bool {
        self.date.is_none()
            && self.occurrence_type.is_none()
            && self.longitude.is_none()
            && self.latitude.is_none()
    }

    /// Hashable fingerprint of every column, used for exact-duplicate removal.
    pub fn fingerprint(&self) -> RowFingerprint {
        RowFingerprint {
            event_id: self.event_id.clone(),
            event_title: self.event_title.clone(),
            category_ids: self.category_ids.clone(),
            category_titles: self.category_titles.clone(),
            date: self.date,
            occurrence_type: self.occurrence_type.clone(),
            longitude: self.longitude.map(f64::to_bits),
            latitude: self.latitude.map(f64::to_bits),
            region: self.region.clone(),
            country: self.country.clone(),
            continent: self.continent,
            calendar: (self.year, self.month, self.day),
        }
    }
}

/// See [`Occurrence::fingerprint`]. Floats compare by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowFingerprint {
    event_id: String,
    event_title: String,
    category_ids: String,
    category_titles: String,
    date: Option<DateTime<Utc>>,
    occurrence_type: Option<String>,
    longitude: Option<u64>,
    latitude: Option<u64>,
    region: Option<String>,
    country: Option<String>,
    continent: Option<Continent>,
    calendar: (Option<i32>, Option<u32>, Option<u32>),
}
