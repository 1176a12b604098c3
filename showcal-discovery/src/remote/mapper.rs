//! Translates accumulated scraped events into the exported-entity batch a
//! remote backend accepts.

use super::ImportBatch;
use showcal_core::domain::{ScrapedEvent, VenueConfig};
use showcal_core::export::{ExportedArtist, ExportedShow, ExportedVenue, SetType, ShowArtist};
use std::collections::BTreeMap;

/// Build an import batch from curated events. Venue city/state come from
/// the static venue configuration; the first billed artist is the
/// headliner, the rest are openers. The batch's artist and venue tables
/// are deduplicated by name.
pub fn batch_from_events(events: &[ScrapedEvent], venues: &[VenueConfig], dry_run: bool) -> ImportBatch {
    let mut artists: BTreeMap<String, ExportedArtist> = BTreeMap::new();
    let mut exported_venues: BTreeMap<String, ExportedVenue> = BTreeMap::new();
    let mut shows = Vec::with_capacity(events.len());

    for event in events {
        let venue_config = venues.iter().find(|v| v.slug == event.venue_slug);
        let (city, state) = match venue_config {
            Some(v) => (v.city.clone(), v.state.clone()),
            None => (String::new(), String::new()),
        };

        let show_venue = ExportedVenue {
            name: event.venue_name.clone(),
            city: city.clone(),
            state: state.clone(),
            urls: Vec::new(),
        };
        exported_venues
            .entry(event.venue_name.clone())
            .or_insert_with(|| show_venue.clone());

        let show_artists: Vec<ShowArtist> = event
            .artists
            .iter()
            .enumerate()
            .map(|(position, name)| {
                let artist = ExportedArtist {
                    name: name.clone(),
                    location: None,
                    urls: Vec::new(),
                };
                artists.entry(name.clone()).or_insert_with(|| artist.clone());
                ShowArtist {
                    artist,
                    position: position as u32,
                    set_type: if position == 0 {
                        SetType::Headliner
                    } else {
                        SetType::Opener
                    },
                }
            })
            .collect();

        shows.push(ExportedShow {
            title: event.title.clone(),
            event_day: event.date,
            city,
            state,
            price: None,
            age_requirement: None,
            status: "confirmed".to_string(),
            sold_out: false,
            cancelled: false,
            venues: vec![show_venue],
            artists: show_artists,
        });
    }

    ImportBatch {
        shows,
        artists: artists.into_values().collect(),
        venues: exported_venues.into_values().collect(),
        dry_run,
    }
}
