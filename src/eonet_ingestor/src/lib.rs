//! Incremental ingestion of NASA EONET natural-event records.
//!
//! A run fetches a date range from the events API ([`providers`]), flattens
//! the payload into event and occurrence rows ([`transform`]), adds region,
//! country and continent ([`geo`]), merges the result into the persisted CSV
//! tables ([`store`]) and reports what happened ([`pipeline`]). Read-only
//! consumers use [`summary`] and [`cache`].

pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod geo;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod store;
pub mod summary;
pub mod transform;
