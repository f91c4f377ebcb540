//! Adds region, country and continent to occurrence rows.

use std::time::Duration;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::{
    geo::{
        continent::classify_continent,
        countries::resolve_country,
        geocoder::{
            GeocodeError, LengthMismatchSnafu, Place, ReverseGeocoder, TimeoutSnafu,
        },
    },
    models::{
        coordinate::Coordinate,
        occurrence::{Enrichment, Occurrence},
    },
};

/// Which rows an enrichment pass touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichMode {
    /// Every row with a valid coordinate pair.
    #[default]
    All,
    /// Only rows whose region and country are both still null.
    MissingOnly,
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub mode: EnrichMode,
    pub timeout: Duration,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            mode: EnrichMode::All,
            timeout: Duration::from_secs(60),
        }
    }
}

/// What an enrichment pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichOutcome {
    /// Rows selected for enrichment.
    pub rows: usize,
    /// Distinct rounded coordinate pairs sent to the geocoder.
    pub distinct_points: usize,
    /// Distinct points the geocoder answered with a place.
    pub resolved_points: usize,
    /// Set when the lookup failed and region/country were left null.
    pub unavailable: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Resolved {
    region: Option<String>,
    country: Option<String>,
}

impl From<&Place> for Resolved {
    fn from(place: &Place) -> Self {
        let code = place.country_code.trim();
        Self {
            region: place.region(),
            country: (!code.is_empty()).then(|| resolve_country(code)),
        }
    }
}

async fn lookup(
    geocoder: &dyn ReverseGeocoder,
    points: &[Coordinate],
    timeout: Duration,
) -> Result<Vec<Option<Place>>, GeocodeError> {
    let places = match tokio::time::timeout(timeout, geocoder.reverse_batch(points)).await {
        Ok(result) => result?,
        Err(_) => {
            return TimeoutSnafu {
                seconds: timeout.as_secs(),
            }
            .fail();
        }
    };
    if places.len() != points.len() {
        return LengthMismatchSnafu {
            expected: points.len(),
            got: places.len(),
        }
        .fail();
    }
    Ok(places)
}

/// Enriches `rows` in place.
///
/// Valid coordinate pairs are rounded to four decimals and deduplicated, then
/// resolved in a single batched call. Continent comes from the unrounded pair
/// and is always set, even when the lookup fails. A failed or timed-out lookup
/// leaves region and country null for every selected row and is reported in
/// [`EnrichOutcome::unavailable`]. Rows without a valid pair are not touched.
pub async fn enrich_occurrences(
    rows: &mut [Occurrence],
    geocoder: &dyn ReverseGeocoder,
    options: &EnrichOptions,
) -> EnrichOutcome {
    let targets: Vec<(usize, Coordinate)> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| match options.mode {
            EnrichMode::All => true,
            EnrichMode::MissingOnly => row.needs_enrichment(),
        })
        .filter_map(|(i, row)| row.coordinate().map(|c| (i, c)))
        .collect();

    let mut outcome = EnrichOutcome {
        rows: targets.len(),
        ..Default::default()
    };
    if targets.is_empty() {
        return outcome;
    }

    let mut distinct: IndexMap<(i64, i64), Coordinate> = IndexMap::new();
    for (_, coord) in &targets {
        distinct
            .entry(coord.lookup_key())
            .or_insert_with(|| coord.rounded());
    }
    outcome.distinct_points = distinct.len();
    let points: Vec<Coordinate> = distinct.values().copied().collect();

    let resolved: IndexMap<(i64, i64), Resolved> =
        match lookup(geocoder, &points, options.timeout).await {
            Ok(places) => distinct
                .keys()
                .zip(places.iter())
                .filter_map(|(key, place)| place.as_ref().map(|p| (*key, Resolved::from(p))))
                .collect(),
            Err(err) => {
                warn!(
                    geocoder = geocoder.name(),
                    points = points.len(),
                    error = %err,
                    "Reverse geocoding unavailable; region and country left empty"
                );
                outcome.unavailable = Some(err.to_string());
                IndexMap::new()
            }
        };
    outcome.resolved_points = resolved.len();

    for (i, coord) in targets {
        let Resolved { region, country } = resolved
            .get(&coord.lookup_key())
            .cloned()
            .unwrap_or_default();
        rows[i].apply_enrichment(Enrichment {
            region,
            country,
            continent: classify_continent(Some(coord.latitude), Some(coord.longitude)),
        });
    }

    info!(
        rows = outcome.rows,
        distinct_points = outcome.distinct_points,
        resolved_points = outcome.resolved_points,
        "Enriched occurrences"
    );
    outcome
}
