use crate::apis::ProviderRegistry;
use crate::observability::metrics;
use futures::future::join_all;
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::domain::{BatchPreviewResult, EventStub, ScrapedEvent, VenueConfig};
use std::collections::HashSet;
use tracing::{info, warn};

/// Default ceiling on simultaneous provider calls.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Dispatches preview/scrape calls to the provider registry while bounding
/// how many provider calls run at once. Performs no persistence; every
/// per-venue outcome is data, never a process failure.
pub struct DiscoveryOrchestrator {
    venues: Vec<VenueConfig>,
    providers: ProviderRegistry,
    concurrency: usize,
}

impl DiscoveryOrchestrator {
    pub fn new(venues: Vec<VenueConfig>, providers: ProviderRegistry) -> Self {
        Self {
            venues,
            providers,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Configured venues, in configuration order.
    pub fn venues(&self) -> &[VenueConfig] {
        &self.venues
    }

    pub fn venue(&self, slug: &str) -> Result<&VenueConfig> {
        self.venues
            .iter()
            .find(|v| v.slug == slug)
            .ok_or_else(|| DiscoveryError::UnknownVenue(slug.to_string()))
    }

    /// Cheap, list-only fetch of one venue's upcoming events.
    pub async fn preview(&self, slug: &str) -> Result<Vec<EventStub>> {
        let venue = self.venue(slug)?;
        let provider = self.providers.get(venue.provider_type)?;
        let stubs = provider.preview(venue).await?;
        metrics::discovery::preview_succeeded(slug, stubs.len());
        Ok(stubs)
    }

    /// Detail-level fetch for a set of previously-previewed event ids.
    pub async fn scrape(&self, slug: &str, event_ids: &HashSet<String>) -> Result<Vec<ScrapedEvent>> {
        if event_ids.is_empty() {
            return Err(DiscoveryError::MissingField("event_ids".to_string()));
        }
        let venue = self.venue(slug)?;
        let provider = self.providers.get(venue.provider_type)?;
        let events = provider.scrape(venue, event_ids).await?;
        metrics::discovery::scrape_succeeded(slug, events.len());
        Ok(events)
    }

    /// Preview many venues, at most `concurrency` in flight at a time.
    ///
    /// Input is partitioned into chunks of the ceiling size; each chunk fans
    /// out concurrently and is awaited in full before the next chunk starts.
    /// A venue's failure is captured into its own result slot and never
    /// cancels or blocks its siblings. Result order matches input order.
    pub async fn preview_batch(&self, slugs: &[String]) -> Vec<BatchPreviewResult> {
        let mut results = Vec::with_capacity(slugs.len());
        for chunk in slugs.chunks(self.concurrency) {
            let calls = chunk.iter().map(|slug| async move {
                match self.preview(slug).await {
                    Ok(stubs) => {
                        info!(venue = %slug, count = stubs.len(), "batch preview: venue complete");
                        BatchPreviewResult::ok(slug.clone(), stubs)
                    }
                    Err(e) => {
                        warn!(venue = %slug, error = %e, "batch preview: venue failed");
                        metrics::discovery::preview_failed(slug);
                        BatchPreviewResult::failed(slug.clone(), e.to_string())
                    }
                }
            });
            results.extend(join_all(calls).await);
        }
        results
    }
}
