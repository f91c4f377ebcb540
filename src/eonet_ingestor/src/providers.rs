//! Provider abstraction for natural-event sources.
//!
//! [`EventProvider`] is the seam between the pipeline and the network. The
//! production implementation is [`eonet_rest::EonetProvider`]; tests plug in
//! static payloads.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use eonet_ingestor::models::events_request::EventsRequest;
//! use eonet_ingestor::providers::{EventProvider, EventsResponse, ProviderError};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl EventProvider for Canned {
//!     async fn fetch_events(&self, _request: &EventsRequest) -> Result<EventsResponse, ProviderError> {
//!         Ok(EventsResponse::default())
//!     }
//! }
//! ```

pub mod eonet_rest;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::events_request::EventsRequest;

pub use eonet_rest::response::EventsResponse;

/// Fetches one page of raw events for a request.
#[async_trait]
pub trait EventProvider: Send + Sync {
    async fn fetch_events(&self, request: &EventsRequest) -> Result<EventsResponse, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within an `EventProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Network failure or timeout before a response arrived.
    #[snafu(display("API request failed: {source}"))]
    Request {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a non-success status.
    #[snafu(display("API returned HTTP {status}: {body}"))]
    Status {
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The body was not the expected JSON document.
    #[snafu(display("Failed to decode API response: {source}"))]
    Decode {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}
