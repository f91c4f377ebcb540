//! Parameters of one events pull.

use serde::{Deserialize, Serialize};

use crate::models::date_range::DateRange;

/// Lifecycle filter understood by the events API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Closed,
    #[default]
    All,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Open => "open",
            EventStatus::Closed => "closed",
            EventStatus::All => "all",
        }
    }
}

/// What to fetch. Only `range` is required by the API.
#[derive(Clone, Debug, PartialEq)]
pub struct EventsRequest {
    pub range: DateRange,
    pub status: Option<EventStatus>,
    pub limit: Option<u32>,
    /// Category ids, e.g. `wildfires`, `severeStorms`.
    pub categories: Vec<String>,
}

impl EventsRequest {
    pub fn for_range(range: DateRange) -> Self {
        Self {
            range,
            status: None,
            limit: None,
            categories: Vec::new(),
        }
    }
}
