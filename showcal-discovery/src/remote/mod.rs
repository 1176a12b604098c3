use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use showcal_core::common::error::Result;
use showcal_core::export::{ExportedArtist, ExportedShow, ExportedVenue, ImportReport};
use uuid::Uuid;

pub mod client;
pub mod import;
pub mod mapper;
pub mod reconcile;

pub use client::HttpRemote;
pub use import::{ImportExecutor, ImportOutcome, ImportTarget, TargetSelector};

/// Show as returned by a target's bulk listing endpoint: just enough for
/// natural-key matching plus the fields that decide updatability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteShow {
    pub id: Uuid,
    pub title: String,
    pub event_day: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_requirement: Option<String>,
}

/// Per-artist/venue match suggestion from a target's import-preview
/// endpoint. Artist and venue identity resolution belongs to the backend's
/// canonical store, not to this tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySuggestion {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<Uuid>,
    pub will_create: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub artists: Vec<EntitySuggestion>,
    pub venues: Vec<EntitySuggestion>,
    pub can_import: bool,
}

/// Entity batch submitted to a target. With `dry_run` set the target
/// computes the same statistics without persisting anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub shows: Vec<ExportedShow>,
    pub artists: Vec<ExportedArtist>,
    pub venues: Vec<ExportedVenue>,
    pub dry_run: bool,
}

/// Read/write surface of one remote content backend. Kept behind a trait
/// so reconciliation and import logic run against mocks in tests.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// Bulk show listing; `status` filters ("all" for reconciliation),
    /// `limit` is the page size.
    async fn list_shows(&self, status: &str, limit: u32) -> Result<Vec<RemoteShow>>;

    /// Ask the target how it would match the batch's artists and venues.
    async fn import_preview(&self, shows: &[ExportedShow]) -> Result<ImportPreview>;

    /// Submit an entity batch. Statistics come back from the target and
    /// are never recomputed locally. Not retried: the target makes no
    /// idempotency promise for writes.
    async fn import(&self, batch: &ImportBatch) -> Result<ImportReport>;
}
