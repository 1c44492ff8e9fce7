use std::num::NonZeroUsize;
use std::path::{self, Component, Path, PathBuf};

use crate::error::HarvestError;
use crate::extract::ExtractionSettings;
use crate::fetch::FetchSettings;
use crate::records::GeometryKind;

/// Everything a harvest run needs, fixed before it starts.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Feature layer URL, normally ending in `/FeatureServer/{n}` or `/MapServer/{n}`.
    pub endpoint: String,
    /// Where raw chunk payloads are staged. Cleared at the start of each run.
    pub staging_dir: PathBuf,
    /// Scratch directory for converted record sets. Recreated by every merge.
    pub workspace_dir: PathBuf,
    /// Destination store directory.
    pub destination_dir: PathBuf,
    pub collection: String,
    pub geometry: GeometryKind,
    /// Replaces the server's `maxRecordCount` as chunk size when set.
    pub page_size_override: Option<NonZeroUsize>,
    pub extraction: ExtractionSettings,
    pub fetch: FetchSettings,
}

impl HarvestConfig {
    /// Defaults with all working directories under `base_dir`.
    pub fn new(
        endpoint: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        collection: impl Into<String>,
    ) -> Self {
        let base_dir = base_dir.into();
        Self {
            endpoint: endpoint.into(),
            staging_dir: base_dir.join("staging"),
            workspace_dir: base_dir.join("intermediate"),
            destination_dir: base_dir.join("destination"),
            collection: collection.into(),
            geometry: GeometryKind::Polygon,
            page_size_override: None,
            extraction: ExtractionSettings::default(),
            fetch: FetchSettings::default(),
        }
    }

    /// Staging and workspace are wiped wholesale, so none of the three
    /// directories may equal or contain another.
    pub fn check_directories(&self) -> Result<(), HarvestError> {
        let dirs = [
            ("staging_dir", &self.staging_dir),
            ("workspace_dir", &self.workspace_dir),
            ("destination_dir", &self.destination_dir),
        ];
        let resolved: Vec<PathBuf> = dirs.iter().map(|(_, dir)| comparable(dir)).collect();
        for i in 0..dirs.len() {
            for j in i + 1..dirs.len() {
                if resolved[i].starts_with(&resolved[j]) || resolved[j].starts_with(&resolved[i]) {
                    return Err(HarvestError::OverlappingDirectories {
                        first: dirs[i].0,
                        first_path: dirs[i].1.clone(),
                        second: dirs[j].0,
                        second_path: dirs[j].1.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Absolute form with `.`/`..` folded and the longest existing prefix
/// canonicalized, so symlinked and not-yet-created paths compare alike.
fn comparable(dir: &Path) -> PathBuf {
    let absolute = path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut missing = Vec::new();
    let mut existing = lexical.as_path();
    loop {
        if let Ok(mut real) = existing.canonicalize() {
            real.extend(missing.iter().rev());
            return real;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return lexical.clone(),
        }
    }
}
