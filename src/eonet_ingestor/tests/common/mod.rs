#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::NaiveDate;
use eonet_ingestor::{
    geo::{EnrichOptions, GeocodeError, Place, ReverseGeocoder, geocoder::LookupSnafu},
    models::{coordinate::Coordinate, date_range::DateRange, events_request::EventsRequest},
    pipeline::{Pipeline, PipelineOptions, RequestTemplate},
    providers::{EventProvider, EventsResponse, ProviderError, StatusSnafu},
    store::{MergeOptions, TableStore},
};
use serde_json::{Value, json};

/// Serves one canned payload per call, in order; repeats the last one.
pub struct StaticProvider {
    payloads: Vec<EventsResponse>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<EventsRequest>>,
}

impl StaticProvider {
    pub fn new(payloads: Vec<EventsResponse>) -> Self {
        Self {
            payloads,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EventProvider for StaticProvider {
    async fn fetch_events(&self, request: &EventsRequest) -> Result<EventsResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let payload = self
            .payloads
            .get(n)
            .or(self.payloads.last())
            .cloned()
            .unwrap_or_default();
        Ok(payload)
    }
}

pub struct FailingProvider;

#[async_trait]
impl EventProvider for FailingProvider {
    async fn fetch_events(&self, _: &EventsRequest) -> Result<EventsResponse, ProviderError> {
        StatusSnafu {
            status: 500u16,
            body: "internal error",
        }
        .fail()
    }
}

/// Resolves points by rough longitude band; counts calls.
pub struct FakeGeocoder {
    pub calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse_batch(&self, points: &[Coordinate]) -> Result<Vec<Option<Place>>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(points
            .iter()
            .map(|p| {
                let (admin1, admin2) = if p.longitude < -100.0 {
                    ("California", "Los Angeles County")
                } else {
                    ("New York", "New York County")
                };
                Some(Place {
                    name: "somewhere".into(),
                    admin1: admin1.into(),
                    admin2: admin2.into(),
                    country_code: "US".into(),
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub struct DownGeocoder;

#[async_trait]
impl ReverseGeocoder for DownGeocoder {
    async fn reverse_batch(&self, _: &[Coordinate]) -> Result<Vec<Option<Place>>, GeocodeError> {
        LookupSnafu {
            message: "index unreachable",
        }
        .fail()
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

pub fn payload(events: Value) -> EventsResponse {
    serde_json::from_value(json!({ "title": "EONET Events", "events": events })).unwrap()
}

/// Event A with two points (New York on 2024-03-01, Los Angeles on
/// 2024-03-05) and event B without geometry.
pub fn two_event_payload() -> EventsResponse {
    payload(json!([
        {
            "id": "EONET_A",
            "title": "Wildfire A",
            "link": "https://eonet.gsfc.nasa.gov/api/v3/events/EONET_A",
            "closed": null,
            "categories": [{"id": "wildfires", "title": "Wildfires"}],
            "sources": [{"id": "InciWeb", "url": "https://inciweb.example"}],
            "geometry": [
                {"date": "2024-03-05T00:00:00Z", "type": "Point", "coordinates": [-118.2, 34.0]},
                {"date": "2024-03-01T00:00:00Z", "type": "Point", "coordinates": [-74.0, 40.7]}
            ]
        },
        {
            "id": "EONET_B",
            "title": "Iceberg B",
            "categories": [{"id": "seaLakeIce", "title": "Sea and Lake Ice"}],
            "geometry": []
        }
    ]))
}

pub fn store_in(dir: &std::path::Path) -> TableStore {
    TableStore::new(dir.join("events.csv"), dir.join("occurrences.csv"))
}

pub fn options(merge: MergeOptions) -> PipelineOptions {
    PipelineOptions {
        request: RequestTemplate::default(),
        merge,
        enrich: EnrichOptions::default(),
        raw_dir: None,
    }
}

pub fn pipeline(
    provider: Arc<dyn EventProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    store: TableStore,
    merge: MergeOptions,
) -> Pipeline {
    Pipeline::new(provider, geocoder, store, options(merge))
}
