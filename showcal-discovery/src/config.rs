use serde::Deserialize;
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::domain::VenueConfig;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "showcal.toml";

/// Top-level configuration file: `[discovery]` settings, `[[venues]]` and
/// `[[targets]]` tables. Loaded once at startup, read-only afterwards.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub discovery: DiscoverySettings,
    pub venues: Vec<VenueConfig>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

/// One remote content backend this instance can import into.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub base_url: String,
    /// Environment variable holding the bearer credential; token
    /// acquisition and storage live outside this tool.
    pub token_env: String,
}

impl TargetConfig {
    pub fn resolve_token(&self) -> Result<String> {
        std::env::var(&self.token_env).map_err(|_| {
            DiscoveryError::Config(format!(
                "target '{}': environment variable {} is not set",
                self.name, self.token_env
            ))
        })
    }
}

impl AppConfig {
    /// Load and validate configuration. The path comes from
    /// `SHOWCAL_CONFIG` when set, falling back to `showcal.toml`.
    pub fn load_default() -> Result<Self> {
        let path =
            std::env::var("SHOWCAL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DiscoveryError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: AppConfig = toml::from_str(&content).map_err(|e| {
            DiscoveryError::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut slugs = HashSet::new();
        for venue in &self.venues {
            if !slugs.insert(venue.slug.as_str()) {
                return Err(DiscoveryError::Config(format!(
                    "duplicate venue slug: {}",
                    venue.slug
                )));
            }
        }
        let mut names = HashSet::new();
        for target in &self.targets {
            if !names.insert(target.name.as_str()) {
                return Err(DiscoveryError::Config(format!(
                    "duplicate target name: {}",
                    target.name
                )));
            }
        }
        Ok(())
    }
}
