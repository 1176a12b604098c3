use super::{ImportBatch, ImportPreview, RemoteApi, RemoteShow};
use serde::Deserialize;
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::export::{ExportedShow, ImportReport};
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = "showcal-discovery/0.1";

/// `RemoteApi` over HTTP with a bearer credential. Remote failures surface
/// verbatim (status plus response body) as `Remote` errors; nothing is
/// retried here.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ShowListResponse {
    shows: Vec<RemoteShow>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(DiscoveryError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl RemoteApi for HttpRemote {
    #[instrument(skip(self))]
    async fn list_shows(&self, status: &str, limit: u32) -> Result<Vec<RemoteShow>> {
        let url = format!("{}/shows", self.base_url);
        debug!(%url, status, limit, "listing remote shows");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("status", status), ("limit", &limit.to_string())])
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let body: ShowListResponse = resp.json().await?;
        Ok(body.shows)
    }

    #[instrument(skip(self, shows))]
    async fn import_preview(&self, shows: &[ExportedShow]) -> Result<ImportPreview> {
        let url = format!("{}/import/preview", self.base_url);
        debug!(%url, count = shows.len(), "requesting import preview");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "shows": shows }))
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    #[instrument(skip(self, batch), fields(dry_run = batch.dry_run))]
    async fn import(&self, batch: &ImportBatch) -> Result<ImportReport> {
        let url = format!("{}/import", self.base_url);
        debug!(%url, shows = batch.shows.len(), dry_run = batch.dry_run, "submitting import");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(batch)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }
}
