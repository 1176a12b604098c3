use super::{parse_event_date, parse_event_time, EventProvider};
use chrono::Utc;
use serde_json::Value;
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::domain::{EventStub, ProviderType, ScrapedEvent, VenueConfig};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_API_BASE: &str = "https://api.etix.com/v2/public";
const USER_AGENT: &str = "showcal-discovery/0.1";

/// Ticketing-platform adapter. The venue's `source` field is its numeric
/// Etix venue id; the listing endpoint returns every on-sale activity and
/// the detail endpoint fills in times, pricing, and performers.
#[derive(Debug)]
pub struct EtixProvider {
    client: reqwest::Client,
    base_url: String,
}

impl EtixProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<Option<Value>> {
        debug!(%url, "etix GET");
        let resp = self.client.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(DiscoveryError::Provider {
                message: format!("etix returned status {} for {}", resp.status(), url),
            });
        }
        Ok(Some(resp.json::<Value>().await?))
    }
}

impl Default for EtixProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventProvider for EtixProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Etix
    }

    #[instrument(skip(self, venue), fields(venue = %venue.slug))]
    async fn preview(&self, venue: &VenueConfig) -> Result<Vec<EventStub>> {
        let url = format!("{}/venues/{}/activities", self.base_url, venue.source);
        let body = self
            .fetch_json(&url)
            .await?
            .ok_or_else(|| DiscoveryError::Provider {
                message: format!("etix venue {} not found", venue.source),
            })?;
        let stubs = parse_listing(venue, &body)?;
        info!(count = stubs.len(), "etix preview complete");
        Ok(stubs)
    }

    #[instrument(skip(self, venue, event_ids), fields(venue = %venue.slug))]
    async fn scrape(
        &self,
        venue: &VenueConfig,
        event_ids: &HashSet<String>,
    ) -> Result<Vec<ScrapedEvent>> {
        let mut events = Vec::with_capacity(event_ids.len());
        for id in event_ids {
            let url = format!("{}/activities/{}", self.base_url, id);
            match self.fetch_json(&url).await? {
                Some(body) => match parse_activity(venue, id, &body) {
                    Ok(event) => events.push(event),
                    Err(e) => {
                        warn!(event_id = %id, error = %e, "skipping unparseable activity");
                    }
                },
                // Detail page is gone; the listing was stale. Partial result.
                None => debug!(event_id = %id, "activity no longer exists, skipping"),
            }
        }
        info!(requested = event_ids.len(), scraped = events.len(), "etix scrape complete");
        Ok(events)
    }
}

fn parse_listing(venue: &VenueConfig, body: &Value) -> Result<Vec<EventStub>> {
    let activities = body
        .get("activities")
        .and_then(Value::as_array)
        .ok_or_else(|| DiscoveryError::MissingField("activities".to_string()))?;

    let mut stubs = Vec::with_capacity(activities.len());
    for activity in activities {
        match parse_listing_entry(venue, activity) {
            Some(stub) => stubs.push(stub),
            None => debug!(venue = %venue.slug, "skipping malformed listing entry"),
        }
    }
    if stubs.is_empty() {
        return Err(DiscoveryError::Provider {
            message: format!("no extractable events in etix listing for {}", venue.slug),
        });
    }
    Ok(stubs)
}

fn parse_listing_entry(venue: &VenueConfig, activity: &Value) -> Option<EventStub> {
    let id = activity.get("id")?;
    let id = match id {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    let title = activity.get("name")?.as_str()?.trim().to_string();
    let date = parse_event_date(activity.get("startDate")?.as_str()?)?;
    Some(EventStub {
        id,
        title,
        date,
        venue: venue.name.clone(),
    })
}

fn parse_activity(venue: &VenueConfig, id: &str, body: &Value) -> Result<ScrapedEvent> {
    let title = body
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DiscoveryError::MissingField("name".to_string()))?
        .trim()
        .to_string();
    let date = body
        .get("startDate")
        .and_then(Value::as_str)
        .and_then(parse_event_date)
        .ok_or_else(|| DiscoveryError::MissingField("startDate".to_string()))?;

    let artists: Vec<String> = body
        .get("performers")
        .and_then(Value::as_array)
        .map(|performers| {
            performers
                .iter()
                .filter_map(|p| p.get("name").and_then(Value::as_str))
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(ScrapedEvent {
        id: id.to_string(),
        title,
        date,
        venue_name: venue.name.clone(),
        venue_slug: venue.slug.clone(),
        image_url: body
            .get("imageUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
        doors_time: body
            .get("doorTime")
            .and_then(Value::as_str)
            .and_then(parse_event_time),
        show_time: body
            .get("startDate")
            .and_then(Value::as_str)
            .and_then(parse_event_time),
        ticket_url: body
            .get("purchaseUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
        artists,
        scraped_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn venue() -> VenueConfig {
        VenueConfig {
            slug: "the-crocodile".to_string(),
            name: "The Crocodile".to_string(),
            provider_type: ProviderType::Etix,
            source: "9450".to_string(),
            city: "Seattle".to_string(),
            state: "WA".to_string(),
        }
    }

    #[test]
    fn listing_maps_activities_to_stubs() {
        let body = json!({
            "activities": [
                {"id": 101, "name": "Band X", "startDate": "2025-06-01T20:00:00-07:00"},
                {"id": "102", "name": " Band Y ", "startDate": "2025-06-02"},
                {"name": "missing id, dropped"}
            ]
        });
        let stubs = parse_listing(&venue(), &body).unwrap();
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].id, "101");
        assert_eq!(stubs[1].title, "Band Y");
        assert_eq!(stubs[1].venue, "The Crocodile");
    }

    #[test]
    fn empty_listing_is_a_provider_error() {
        let body = json!({"activities": []});
        let err = parse_listing(&venue(), &body).unwrap_err();
        assert!(matches!(err, DiscoveryError::Provider { .. }));
    }

    #[test]
    fn activity_detail_maps_optional_fields() {
        let body = json!({
            "name": "Band X",
            "startDate": "2025-06-01T20:00:00-07:00",
            "doorTime": "19:00",
            "imageUrl": "https://img.etix.com/101.jpg",
            "purchaseUrl": "https://etix.com/ticket/p/101",
            "performers": [
                {"name": "Band X"},
                {"name": "The Openers"}
            ]
        });
        let event = parse_activity(&venue(), "101", &body).unwrap();
        assert_eq!(event.id, "101");
        assert_eq!(event.artists, vec!["Band X", "The Openers"]);
        assert_eq!(event.doors_time, chrono::NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(event.show_time, chrono::NaiveTime::from_hms_opt(20, 0, 0));
        assert_eq!(event.venue_slug, "the-crocodile");
    }

    #[test]
    fn activity_without_date_is_rejected() {
        let body = json!({"name": "Band X"});
        let err = parse_activity(&venue(), "101", &body).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingField(_)));
    }
}
