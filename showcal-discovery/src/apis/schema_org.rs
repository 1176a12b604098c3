use super::{parse_event_date, parse_event_time, EventProvider};
use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::Value;
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::domain::{EventStub, ProviderType, ScrapedEvent, VenueConfig};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = "showcal-discovery/0.1";

/// Structured-data adapter for venue calendar pages that embed schema.org
/// `Event` JSON-LD. The venue's `source` field is the calendar page URL.
///
/// Event ids are derived from the event's own URL when it has one, else
/// from date plus slugified title; both are stable across re-previews of
/// the same page.
#[derive(Debug)]
pub struct SchemaOrgProvider {
    client: reqwest::Client,
}

impl SchemaOrgProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<Option<String>> {
        debug!(%url, "schema_org GET");
        let resp = self.client.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(DiscoveryError::Provider {
                message: format!("calendar page returned status {} for {}", resp.status(), url),
            });
        }
        Ok(Some(resp.text().await?))
    }

    async fn listing_events(&self, venue: &VenueConfig) -> Result<Vec<Value>> {
        let html = self
            .fetch_page(&venue.source)
            .await?
            .ok_or_else(|| DiscoveryError::Provider {
                message: format!("calendar page not found for {}", venue.slug),
            })?;
        let events = extract_jsonld_events(&html);
        if events.is_empty() {
            return Err(DiscoveryError::Provider {
                message: format!("no schema.org events found on {}", venue.source),
            });
        }
        Ok(events)
    }
}

impl Default for SchemaOrgProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventProvider for SchemaOrgProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::SchemaOrg
    }

    #[instrument(skip(self, venue), fields(venue = %venue.slug))]
    async fn preview(&self, venue: &VenueConfig) -> Result<Vec<EventStub>> {
        let events = self.listing_events(venue).await?;
        let stubs: Vec<EventStub> = events
            .iter()
            .filter_map(|event| stub_from_event(venue, event))
            .collect();
        if stubs.is_empty() {
            return Err(DiscoveryError::Provider {
                message: format!("no parseable events on {}", venue.source),
            });
        }
        info!(count = stubs.len(), "schema_org preview complete");
        Ok(stubs)
    }

    #[instrument(skip(self, venue, event_ids), fields(venue = %venue.slug))]
    async fn scrape(
        &self,
        venue: &VenueConfig,
        event_ids: &HashSet<String>,
    ) -> Result<Vec<ScrapedEvent>> {
        let listing = self.listing_events(venue).await?;

        let mut events = Vec::with_capacity(event_ids.len());
        for entry in listing {
            let id = match event_id(&entry) {
                Some(id) if event_ids.contains(&id) => id,
                _ => continue,
            };

            // Follow the event's own page when it has one; detail pages
            // usually carry performers and door times the listing omits.
            let detail = match entry.get("url").and_then(Value::as_str) {
                Some(url) => match self.fetch_page(url).await {
                    Ok(Some(html)) => extract_jsonld_events(&html).into_iter().next(),
                    Ok(None) => {
                        debug!(event_id = %id, "detail page gone, using listing data");
                        None
                    }
                    Err(e) => {
                        warn!(event_id = %id, error = %e, "detail fetch failed, using listing data");
                        None
                    }
                },
                None => None,
            };

            let source = detail.as_ref().unwrap_or(&entry);
            match scraped_from_event(venue, &id, source) {
                Some(event) => events.push(event),
                None => debug!(event_id = %id, "skipping event with unparseable detail"),
            }
        }
        info!(requested = event_ids.len(), scraped = events.len(), "schema_org scrape complete");
        Ok(events)
    }
}

/// Pull every schema.org Event object out of a page's JSON-LD blocks.
/// Handles a bare object, a top-level array, and `@graph` containers.
fn extract_jsonld_events(html: &str) -> Vec<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();

    let mut events = Vec::new();
    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let parsed: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => continue,
        };
        collect_events(&parsed, &mut events);
    }
    events
}

fn collect_events(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_events(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_events(graph, out);
            }
            let is_event = map
                .get("@type")
                .and_then(Value::as_str)
                .map(|t| t == "Event" || t == "MusicEvent")
                .unwrap_or(false);
            if is_event {
                out.push(value.clone());
            }
        }
        _ => {}
    }
}

fn event_id(event: &Value) -> Option<String> {
    if let Some(url) = event.get("url").and_then(Value::as_str) {
        let tail = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
        if !tail.is_empty() {
            return Some(tail.to_string());
        }
    }
    let title = event.get("name").and_then(Value::as_str)?;
    let date = event.get("startDate").and_then(Value::as_str)?;
    let day = date.split('T').next().unwrap_or(date);
    Some(format!("{}-{}", day, slugify(title)))
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut last_dash = true;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn stub_from_event(venue: &VenueConfig, event: &Value) -> Option<EventStub> {
    let id = event_id(event)?;
    let title = event.get("name")?.as_str()?.trim().to_string();
    let date = parse_event_date(event.get("startDate")?.as_str()?)?;
    Some(EventStub {
        id,
        title,
        date,
        venue: venue.name.clone(),
    })
}

fn scraped_from_event(venue: &VenueConfig, id: &str, event: &Value) -> Option<ScrapedEvent> {
    let title = event.get("name")?.as_str()?.trim().to_string();
    let date = parse_event_date(event.get("startDate")?.as_str()?)?;

    let image_url = match event.get("image") {
        Some(Value::String(url)) => Some(url.clone()),
        Some(Value::Array(urls)) => urls.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    let artists = match event.get("performer") {
        Some(Value::Array(performers)) => performers
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .map(|name| name.trim().to_string())
            .collect(),
        Some(Value::Object(performer)) => performer
            .get("name")
            .and_then(Value::as_str)
            .map(|name| vec![name.trim().to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let ticket_url = event
        .get("offers")
        .and_then(|offers| match offers {
            Value::Array(items) => items.first(),
            other => Some(other),
        })
        .and_then(|offer| offer.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ScrapedEvent {
        id: id.to_string(),
        title,
        date,
        venue_name: venue.name.clone(),
        venue_slug: venue.slug.clone(),
        image_url,
        doors_time: event
            .get("doorTime")
            .and_then(Value::as_str)
            .and_then(parse_event_time),
        show_time: event
            .get("startDate")
            .and_then(Value::as_str)
            .and_then(parse_event_time),
        ticket_url,
        artists,
        scraped_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue() -> VenueConfig {
        VenueConfig {
            slug: "tractor-tavern".to_string(),
            name: "Tractor Tavern".to_string(),
            provider_type: ProviderType::SchemaOrg,
            source: "https://tractortavern.example.com/calendar".to_string(),
            city: "Seattle".to_string(),
            state: "WA".to_string(),
        }
    }

    const CALENDAR_PAGE: &str = r#"
<html><head>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@graph": [
    {
      "@type": "MusicEvent",
      "name": "Band X",
      "startDate": "2025-06-01T20:00:00-07:00",
      "doorTime": "19:00",
      "url": "https://tractortavern.example.com/events/band-x-june",
      "performer": [{"@type": "MusicGroup", "name": "Band X"}],
      "offers": {"@type": "Offer", "url": "https://tickets.example.com/band-x"}
    },
    {
      "@type": "Event",
      "name": "Trivia Night",
      "startDate": "2025-06-03"
    },
    {"@type": "Place", "name": "not an event"}
  ]
}
</script>
<script type="application/ld+json">not even json</script>
</head><body></body></html>
"#;

    #[test]
    fn extracts_events_from_graph_and_ignores_noise() {
        let events = extract_jsonld_events(CALENDAR_PAGE);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn stub_ids_are_stable_across_reparses() {
        let first = extract_jsonld_events(CALENDAR_PAGE);
        let second = extract_jsonld_events(CALENDAR_PAGE);
        let ids_first: Vec<String> = first.iter().filter_map(event_id).collect();
        let ids_second: Vec<String> = second.iter().filter_map(event_id).collect();
        assert_eq!(ids_first, ids_second);
        assert_eq!(ids_first[0], "band-x-june");
        assert_eq!(ids_first[1], "2025-06-03-trivia-night");
    }

    #[test]
    fn stub_carries_title_date_and_venue_label() {
        let events = extract_jsonld_events(CALENDAR_PAGE);
        let stub = stub_from_event(&venue(), &events[0]).unwrap();
        assert_eq!(stub.title, "Band X");
        assert_eq!(stub.date, chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(stub.venue, "Tractor Tavern");
    }

    #[test]
    fn scraped_event_maps_performers_and_offers() {
        let events = extract_jsonld_events(CALENDAR_PAGE);
        let event = scraped_from_event(&venue(), "band-x-june", &events[0]).unwrap();
        assert_eq!(event.artists, vec!["Band X"]);
        assert_eq!(
            event.ticket_url.as_deref(),
            Some("https://tickets.example.com/band-x")
        );
        assert_eq!(event.doors_time, chrono::NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(event.venue_slug, "tractor-tavern");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Band X & The Openers!"), "band-x-the-openers");
    }
}
