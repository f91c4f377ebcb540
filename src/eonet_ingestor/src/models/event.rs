//! Event metadata rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{continent::Continent, timestamp::opt_timestamp};

/// One row per source event, as persisted in `events.csv`.
///
/// `categories`, `category_ids` and `sources` stay structured sequences
/// (JSON arrays inside the CSV cell). The fields from `date` onwards are
/// copied from the event's first occurrence and are null until derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default, with = "opt_timestamp")]
    pub closed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "seq")]
    pub categories: Vec<String>,
    #[serde(default, with = "seq")]
    pub category_ids: Vec<String>,
    #[serde(default, with = "seq")]
    pub sources: Vec<String>,

    #[serde(default, with = "opt_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub continent: Option<Continent>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub category_titles: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl Event {
    /// Column order of the persisted table; matches the field order above.
    pub const COLUMNS: &'static [&'static str] = &[
        "event_id",
        "title",
        "description",
        "link",
        "closed",
        "status",
        "categories",
        "category_ids",
        "sources",
        "date",
        "longitude",
        "latitude",
        "continent",
        "country",
        "category_titles",
        "year",
    ];

    pub fn new(event_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            title: title.into(),
            description: None,
            link: String::new(),
            closed: None,
            status: None,
            categories: Vec::new(),
            category_ids: Vec::new(),
            sources: Vec::new(),
            date: None,
            longitude: None,
            latitude: None,
            continent: None,
            country: None,
            category_titles: None,
            year: None,
        }
    }

    /// Resets every first-occurrence field to null.
    pub fn clear_first_occurrence(&mut self) {
        self.date = None;
        self.longitude = None;
        self.latitude = None;
        self.continent = None;
        self.country = None;
        self.category_titles = None;
        self.year = None;
    }
}

/// Serde adapter for sequence columns.
///
/// Writes a JSON array string. Reads a JSON array, or falls back to a
/// comma-joined list so tables written by other tools still load.
pub mod seq {
    use serde::{Deserialize, Deserializer, Serializer, ser::Error as _};

    pub fn serialize<S: Serializer>(value: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        let json = serde_json::to_string(value).map_err(S::Error::custom)?;
        serializer.serialize_str(&json)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(parse_list).unwrap_or_default())
    }

    pub fn parse_list(raw: &str) -> Vec<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Vec::new();
        }
        if raw.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
                return items;
            }
        }
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
