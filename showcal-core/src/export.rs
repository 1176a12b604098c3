//! Normalized record shapes sent to remote content backends, and the
//! classification types produced when reconciling candidates against a
//! target's existing inventory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
    Headliner,
    Opener,
}

/// Artist as transmitted to a backend: identity plus contact surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedArtist {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Flat set of social/contact URLs; the backend decides what they are.
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedVenue {
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Billing slot on a show.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowArtist {
    pub artist: ExportedArtist,
    pub position: u32,
    pub set_type: SetType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedShow {
    pub title: String,
    pub event_day: NaiveDate,
    pub city: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_requirement: Option<String>,
    pub status: String,
    pub sold_out: bool,
    pub cancelled: bool,
    pub venues: Vec<ExportedVenue>,
    pub artists: Vec<ShowArtist>,
}

/// How a candidate relates to a target's current inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchClass {
    New,
    ExistingUnchanged,
    ExistingUpdatable,
}

/// Result of matching one candidate show against one target. Recomputed on
/// every reconciliation pass, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowMatch {
    pub candidate: ExportedShow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<Uuid>,
    pub class: MatchClass,
}

/// Per-entity-type statistics returned by a target for one import request.
/// These come straight from the backend's response; nothing is recomputed
/// locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub total: u32,
    pub imported: u32,
    pub duplicates: u32,
    pub updated: u32,
    pub errors: u32,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// One target's full answer to an import request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub shows: ImportStats,
    pub artists: ImportStats,
    pub venues: ImportStats,
}
