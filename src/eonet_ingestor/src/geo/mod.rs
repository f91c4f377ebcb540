//! Geographic enrichment: continent heuristic, country names and reverse geocoding.

pub mod continent;
pub mod countries;
pub mod enrich;
pub mod geocoder;
pub mod geonames;

pub use enrich::{EnrichMode, EnrichOptions, EnrichOutcome, enrich_occurrences};
pub use geocoder::{GeocodeError, Place, ReverseGeocoder};
pub use geonames::GeoNamesGeocoder;
