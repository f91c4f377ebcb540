//! Cached dashboard data for ad-hoc date ranges.
//!
//! A dashboard asks for a range that may not be in the persisted tables, so
//! [`DashboardLoader`] fetches and flattens it on demand and keeps the
//! resulting [`Summary`] for a while. Entries expire after the configured TTL
//! and can be dropped explicitly.

use std::{sync::Arc, time::Duration};

use moka::future::Cache;
use tracing::debug;

use crate::{
    geo::continent::classify_continent,
    models::{continent::Continent, date_range::DateRange},
    pipeline::RequestTemplate,
    providers::{EventProvider, ProviderError},
    store::Tables,
    summary::{Summary, SummaryFilter, summarize},
    transform::flatten_events,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DashboardKey {
    pub range: DateRange,
    pub year: Option<i32>,
    pub continent: Option<Continent>,
}

impl DashboardKey {
    pub fn filter(&self) -> SummaryFilter {
        SummaryFilter {
            year: self.year,
            continent: self.continent,
        }
    }
}

pub struct DashboardLoader {
    provider: Arc<dyn EventProvider>,
    request: RequestTemplate,
    cache: Cache<DashboardKey, Arc<Summary>>,
}

impl DashboardLoader {
    pub fn new(
        provider: Arc<dyn EventProvider>,
        request: RequestTemplate,
        ttl: Duration,
        max_capacity: u64,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        debug!(max_capacity, ttl_secs = ttl.as_secs(), "DashboardLoader initialized");
        Self {
            provider,
            request,
            cache,
        }
    }

    /// Returns the cached summary for `key`, fetching it on a miss.
    ///
    /// Concurrent misses for the same key share one fetch. Failures are not cached.
    pub async fn load(&self, key: DashboardKey) -> Result<Arc<Summary>, Arc<ProviderError>> {
        self.cache
            .try_get_with(key, async move {
                debug!(range = %key.range, "Dashboard cache miss");
                let payload = self
                    .provider
                    .fetch_events(&self.request.for_range(key.range))
                    .await?;
                let flat = flatten_events(&payload);
                let mut tables = Tables {
                    events: flat.events,
                    occurrences: flat.occurrences,
                };
                for row in &mut tables.occurrences {
                    if row.continent.is_none() {
                        row.continent = classify_continent(row.latitude, row.longitude);
                    }
                }
                Ok::<_, ProviderError>(Arc::new(summarize(&tables, key.filter())))
            })
            .await
    }

    pub async fn invalidate(&self, key: &DashboardKey) {
        self.cache.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
