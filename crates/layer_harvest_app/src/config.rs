//! RON configuration file for a harvest run.

use std::fs;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use layer_harvest_core::{RetryPolicy, SoftErrorRule, ALL_FIELDS, QUERY_ERROR_SENTINEL};
use layer_harvest_engine::{
    ExtractionSettings, FetchSettings, GeometryKind, HarvestConfig, DEFAULT_USER_AGENT,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftErrorFile {
    pub status_min: u16,
    pub status_max: u16,
    pub patterns: Vec<String>,
    pub match_error_object: bool,
}

impl Default for SoftErrorFile {
    fn default() -> Self {
        Self {
            status_min: 200,
            status_max: 299,
            patterns: vec![String::from_utf8_lossy(QUERY_ERROR_SENTINEL).into_owned()],
            match_error_object: false,
        }
    }
}

/// On-disk settings. Every field except `endpoint` has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestFile {
    pub endpoint: String,
    pub out_fields: String,
    pub staging_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub collection: String,
    pub geometry: GeometryKind,
    pub request_pause_secs: u64,
    pub page_size_override: Option<usize>,
    pub retry_base_delay_secs: u64,
    pub max_attempts: Option<u32>,
    pub max_elapsed_secs: Option<u64>,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub soft_error: SoftErrorFile,
}

impl Default for HarvestFile {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            out_fields: ALL_FIELDS.to_string(),
            staging_dir: PathBuf::from("staging"),
            workspace_dir: PathBuf::from("intermediate"),
            destination_dir: PathBuf::from("destination"),
            collection: "The_Feature_Class".to_string(),
            geometry: GeometryKind::Polygon,
            request_pause_secs: 10,
            page_size_override: None,
            retry_base_delay_secs: 60,
            max_attempts: None,
            max_elapsed_secs: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 300,
            soft_error: SoftErrorFile::default(),
        }
    }
}

impl HarvestFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Relative directories resolve against `base`, normally the config file's directory.
    pub fn into_config(self, base: &Path) -> Result<HarvestConfig> {
        anyhow::ensure!(!self.endpoint.trim().is_empty(), "`endpoint` must be set");
        anyhow::ensure!(
            self.soft_error.status_min <= self.soft_error.status_max,
            "soft_error.status_min must not exceed status_max"
        );

        let page_size_override = match self.page_size_override {
            Some(size) => Some(
                NonZeroUsize::new(size).context("`page_size_override` must be at least 1")?,
            ),
            None => None,
        };
        let max_attempts = match self.max_attempts {
            Some(n) => Some(NonZeroU32::new(n).context("`max_attempts` must be at least 1")?),
            None => None,
        };

        Ok(HarvestConfig {
            endpoint: self.endpoint,
            staging_dir: base.join(self.staging_dir),
            workspace_dir: base.join(self.workspace_dir),
            destination_dir: base.join(self.destination_dir),
            collection: self.collection,
            geometry: self.geometry,
            page_size_override,
            extraction: ExtractionSettings {
                out_fields: self.out_fields,
                request_pause: Duration::from_secs(self.request_pause_secs),
                retry: RetryPolicy {
                    base_delay: Duration::from_secs(self.retry_base_delay_secs),
                    max_attempts,
                    max_elapsed: self.max_elapsed_secs.map(Duration::from_secs),
                },
                soft_errors: SoftErrorRule {
                    success_statuses: self.soft_error.status_min..=self.soft_error.status_max,
                    body_patterns: self
                        .soft_error
                        .patterns
                        .into_iter()
                        .map(String::into_bytes)
                        .collect(),
                    match_error_object: self.soft_error.match_error_object,
                },
            },
            fetch: FetchSettings {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                user_agent: self.user_agent,
                ..FetchSettings::default()
            },
        })
    }
}
