use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying which adapter handles a venue's external source.
///
/// Adding a source type means adding a variant here and registering one
/// provider implementation under it; the orchestrator stays untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Ticketing-platform JSON feed (listing + per-event detail endpoints).
    Etix,
    /// Venue calendar pages carrying schema.org Event JSON-LD.
    SchemaOrg,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Etix => write!(f, "etix"),
            ProviderType::SchemaOrg => write!(f, "schema_org"),
        }
    }
}

/// Statically configured external event source. Loaded once at startup and
/// read-only for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub slug: String,
    pub name: String,
    pub provider_type: ProviderType,
    /// Source URL or provider-local identifier, interpreted by the provider.
    pub source: String,
    pub city: String,
    pub state: String,
}

/// Preview-level event: enough to decide whether it is worth scraping.
///
/// `id` is provider-local and must be stable across repeated previews of the
/// same venue; selection sets are keyed by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStub {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub venue: String,
}

/// Detail-level event produced by scraping a previously-previewed id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub venue_name: String,
    pub venue_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doors_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
    /// Performer names in billing order.
    pub artists: Vec<String>,
    pub scraped_at: DateTime<Utc>,
}

/// Per-venue outcome of a batch preview. Exactly one of `events` / `error`
/// is populated; a venue's failure never aborts its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPreviewResult {
    pub venue_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventStub>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchPreviewResult {
    pub fn ok(venue_slug: impl Into<String>, events: Vec<EventStub>) -> Self {
        Self {
            venue_slug: venue_slug.into(),
            events: Some(events),
            error: None,
        }
    }

    pub fn failed(venue_slug: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            venue_slug: venue_slug.into(),
            events: None,
            error: Some(error.into()),
        }
    }
}
