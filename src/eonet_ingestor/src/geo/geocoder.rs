//! Reverse-geocoding abstraction.
//!
//! A [`ReverseGeocoder`] resolves a batch of coordinates to the administrative
//! place each one falls in (or is nearest to). The batch is answered
//! positionally: result `i` belongs to point `i`, and `None` means the index
//! has nothing for that point.
//!
//! Implementations must not be relied on to succeed. The enrichment step
//! treats every [`GeocodeError`] as "index unavailable" and degrades.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, Snafu};

use crate::models::coordinate::Coordinate;

/// An administrative place returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Populated-place name (city/town).
    pub name: String,
    /// First-level division (state, province).
    pub admin1: String,
    /// Second-level division (county, district).
    pub admin2: String,
    /// ISO 3166-1 alpha-2 code.
    pub country_code: String,
}

impl Place {
    /// The most specific non-empty administrative division.
    pub fn region(&self) -> Option<String> {
        [&self.admin2, &self.admin1]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(String::from)
    }
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolves every point in one call. The result has the same length and order as `points`.
    async fn reverse_batch(&self, points: &[Coordinate]) -> Result<Vec<Option<Place>>, GeocodeError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Errors that make the geocoding index unusable for a run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GeocodeError {
    /// The index file could not be opened.
    #[snafu(display("Failed to open geocoding index {}: {source}", path.display()))]
    IndexOpen {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A record in the index file could not be parsed.
    #[snafu(display("Malformed geocoding index {} (record {record}): {source}", path.display()))]
    IndexRecord {
        path: PathBuf,
        record: u64,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// The index loaded but holds no places.
    #[snafu(display("Geocoding index {} contains no places", path.display()))]
    EmptyIndex { path: PathBuf, backtrace: Backtrace },

    /// The lookup did not finish within the configured timeout.
    #[snafu(display("Geocoding lookup timed out after {seconds}s"))]
    Timeout { seconds: u64, backtrace: Backtrace },

    /// The blocking lookup task panicked or was cancelled.
    #[snafu(display("Geocoding task failed: {source}"))]
    Task {
        source: tokio::task::JoinError,
        backtrace: Backtrace,
    },

    /// The geocoder broke the positional contract.
    #[snafu(display("Geocoder returned {got} results for {expected} points"))]
    LengthMismatch {
        expected: usize,
        got: usize,
        backtrace: Backtrace,
    },

    /// Any other backend failure.
    #[snafu(display("Geocoding lookup failed: {message}"))]
    Lookup { message: String, backtrace: Backtrace },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(admin1: &str, admin2: &str) -> Place {
        Place {
            name: "Town".into(),
            admin1: admin1.into(),
            admin2: admin2.into(),
            country_code: "US".into(),
        }
    }

    #[test]
    fn region_prefers_most_specific_division() {
        assert_eq!(place("California", "Los Angeles County").region().as_deref(), Some("Los Angeles County"));
        assert_eq!(place("California", "  ").region().as_deref(), Some("California"));
        assert_eq!(place("", "").region(), None);
    }
}
