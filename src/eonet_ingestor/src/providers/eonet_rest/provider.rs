use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use snafu::ResultExt;
use tracing::{debug, info};

use crate::{
    models::events_request::EventsRequest,
    providers::{
        ClientBuildSnafu, DecodeSnafu, EventProvider, EventsResponse, ProviderError,
        ProviderInitError, RequestSnafu, StatusSnafu, eonet_rest::params::construct_params,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://eonet.gsfc.nasa.gov/api/v3/events";

/// Client for the public EONET v3 events endpoint. No credentials needed.
pub struct EonetProvider {
    client: Client,
    base_url: String,
}

impl EonetProvider {
    /// Creates a provider whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EventProvider for EonetProvider {
    async fn fetch_events(&self, request: &EventsRequest) -> Result<EventsResponse, ProviderError> {
        let query = construct_params(request);
        debug!(url = %self.base_url, ?query, "Requesting events");

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .context(RequestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return StatusSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let payload = response.json::<EventsResponse>().await.context(DecodeSnafu)?;
        info!(range = %request.range, events = payload.events.len(), "Fetched events");
        Ok(payload)
    }
}
