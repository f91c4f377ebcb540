#![cfg(test)]
use std::time::Duration;

use chrono::{Days, Utc};
use eonet_ingestor::{
    models::{date_range::DateRange, events_request::EventsRequest},
    providers::{
        EventProvider,
        eonet_rest::{EonetProvider, provider::DEFAULT_BASE_URL},
    },
    transform::flatten_events,
};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore]
async fn test_eonet_provider_fetch_events() {
    // Hits the public API. Set EONET_BASE_URL in .env to point at a mirror.
    let _ = dotenvy::dotenv();
    let base_url = std::env::var("EONET_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let provider =
        EonetProvider::new(base_url, Duration::from_secs(30)).expect("Failed to create EonetProvider");

    let today = Utc::now().date_naive();
    let range = DateRange::new(today.checked_sub_days(Days::new(30)).unwrap(), today).unwrap();
    let mut request = EventsRequest::for_range(range);
    request.limit = Some(5);

    let result = provider.fetch_events(&request).await;
    assert!(result.is_ok(), "fetch_events returned an error: {:?}", result.err());

    let payload = result.unwrap();
    assert!(payload.events.len() <= 5, "Expected at most 5 events due to limit");

    let flat = flatten_events(&payload);
    assert_eq!(flat.events.len(), payload.events.len());
    assert!(flat.occurrences.len() >= flat.events.len());
}
