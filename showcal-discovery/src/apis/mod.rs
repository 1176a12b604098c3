use chrono::{NaiveDate, NaiveTime};
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::domain::{EventStub, ProviderType, ScrapedEvent, VenueConfig};
use std::collections::{HashMap, HashSet};

pub mod etix;
pub mod schema_org;

pub use etix::EtixProvider;
pub use schema_org::SchemaOrgProvider;

/// Pluggable adapter translating one external source type into the common
/// event shapes.
///
/// `preview` is the cheap path: one listing fetch, no detail pages.
/// `scrape` fetches detail only for the requested ids, which must have
/// appeared in a prior preview of the same venue; an id whose detail page
/// has since vanished is skipped silently (partial result, not an error).
/// Implementations surface every failure as a typed error; nothing panics
/// past this boundary.
#[async_trait::async_trait]
pub trait EventProvider: Send + Sync + std::fmt::Debug {
    fn provider_type(&self) -> ProviderType;

    async fn preview(&self, venue: &VenueConfig) -> Result<Vec<EventStub>>;

    async fn scrape(
        &self,
        venue: &VenueConfig,
        event_ids: &HashSet<String>,
    ) -> Result<Vec<ScrapedEvent>>;
}

/// Registry mapping a provider-type tag to its implementation, populated at
/// startup. Adding a source type is one variant plus one `register` call.
pub struct ProviderRegistry {
    providers: HashMap<ProviderType, Box<dyn EventProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with all built-in adapters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(EtixProvider::new()));
        registry.register(Box::new(SchemaOrgProvider::new()));
        registry
    }

    pub fn register(&mut self, provider: Box<dyn EventProvider>) {
        self.providers.insert(provider.provider_type(), provider);
    }

    pub fn get(&self, provider_type: ProviderType) -> Result<&dyn EventProvider> {
        self.providers
            .get(&provider_type)
            .map(|p| p.as_ref())
            .ok_or_else(|| DiscoveryError::UnsupportedProvider(provider_type.to_string()))
    }

}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a calendar date out of a date or datetime string as sources
/// commonly publish them ("2025-06-01", "2025-06-01T19:30:00-07:00").
pub(crate) fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()
}

/// Parse a wall-clock time out of an ISO datetime or bare time string.
pub(crate) fn parse_event_time(raw: &str) -> Option<NaiveTime> {
    let clock = match raw.split_once('T') {
        Some((_, rest)) => rest,
        None => raw,
    };
    // Strip a trailing zone offset ("-07:00", "+01:00", "Z") if present.
    let clock = clock.trim_end_matches('Z');
    let clock = clock.split('+').next().unwrap_or(clock);
    let clock = match clock.rfind('-') {
        Some(idx) if idx >= 5 => &clock[..idx],
        _ => clock,
    };
    NaiveTime::parse_from_str(clock.trim(), "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(clock.trim(), "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_datetime_dates() {
        assert_eq!(
            parse_event_date("2025-06-01"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(
            parse_event_date("2025-06-01T19:30:00-07:00"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_event_date("not a date"), None);
    }

    #[test]
    fn parses_times_with_and_without_offsets() {
        assert_eq!(
            parse_event_time("2025-06-01T19:30:00-07:00"),
            NaiveTime::from_hms_opt(19, 30, 0)
        );
        assert_eq!(
            parse_event_time("2025-06-01T19:30:00Z"),
            NaiveTime::from_hms_opt(19, 30, 0)
        );
        assert_eq!(parse_event_time("20:00"), NaiveTime::from_hms_opt(20, 0, 0));
        assert_eq!(parse_event_time("doors at 8"), None);
    }

    #[test]
    fn registry_rejects_unregistered_types() {
        let registry = ProviderRegistry::new();
        let err = registry.get(ProviderType::Etix).unwrap_err();
        assert!(matches!(err, DiscoveryError::UnsupportedProvider(_)));
    }

    #[test]
    fn builtin_registry_covers_all_tags() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.get(ProviderType::Etix).is_ok());
        assert!(registry.get(ProviderType::SchemaOrg).is_ok());
    }
}
