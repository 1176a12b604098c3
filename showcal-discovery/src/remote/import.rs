use super::{ImportBatch, RemoteApi};
use crate::observability::metrics;
use futures::future::join_all;
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::export::ImportReport;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Which configured backends an import request addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    Named(String),
    All,
}

impl TargetSelector {
    pub fn parse_arg(s: &str) -> Self {
        match s {
            "all" | "both" => TargetSelector::All,
            name => TargetSelector::Named(name.to_string()),
        }
    }
}

impl FromStr for TargetSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse_arg(s))
    }
}

/// One configured remote backend.
pub struct ImportTarget {
    pub name: String,
    pub api: Arc<dyn RemoteApi>,
}

/// Aggregated outcome of a multi-target import: completed targets keyed by
/// name, and failed targets keyed by name with the error that stopped
/// them. One target's failure never discards another target's report.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub results: HashMap<String, ImportReport>,
    pub failures: HashMap<String, String>,
}

/// Submits entity batches to one or all configured targets, isolating
/// failures per target.
pub struct ImportExecutor {
    targets: Vec<ImportTarget>,
}

impl ImportExecutor {
    pub fn new(targets: Vec<ImportTarget>) -> Self {
        Self { targets }
    }

    pub fn select(&self, selector: &TargetSelector) -> Result<Vec<&ImportTarget>> {
        match selector {
            TargetSelector::All => Ok(self.targets.iter().collect()),
            TargetSelector::Named(name) => self
                .targets
                .iter()
                .find(|t| &t.name == name)
                .map(|t| vec![t])
                .ok_or_else(|| DiscoveryError::Config(format!("unknown import target: {}", name))),
        }
    }

    /// Issue one write request per selected target, all independently; a
    /// target that errors lands in `failures` without affecting the rest.
    /// Statistics are whatever each target reported.
    pub async fn run(&self, selector: &TargetSelector, batch: &ImportBatch) -> Result<ImportOutcome> {
        let targets = self.select(selector)?;

        let requests = targets.iter().map(|target| async move {
            let result = target.api.import(batch).await;
            (target.name.as_str(), result)
        });

        let mut outcome = ImportOutcome::default();
        for (name, result) in join_all(requests).await {
            match result {
                Ok(report) => {
                    info!(
                        target = name,
                        shows_imported = report.shows.imported,
                        dry_run = batch.dry_run,
                        "import request complete"
                    );
                    metrics::import::target_succeeded(name);
                    outcome.results.insert(name.to_string(), report);
                }
                Err(e) => {
                    warn!(target = name, error = %e, "import request failed");
                    metrics::import::target_failed(name);
                    outcome.failures.insert(name.to_string(), e.to_string());
                }
            }
        }
        Ok(outcome)
    }
}
