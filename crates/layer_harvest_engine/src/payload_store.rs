use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::engine_info;

use crate::persist::{ensure_dir, recreate_dir, AtomicFileWriter, PersistError};

const PAYLOAD_EXTENSION: &str = "json";

/// One staged response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPayload {
    pub ordinal: usize,
    pub bytes: Vec<u8>,
}

/// Staging directory holding one raw payload per chunk as `{ordinal:06}.json`.
///
/// Single writer per run. Each payload lands via temp file and rename, so a
/// file under a payload name is always complete.
#[derive(Debug, Clone)]
pub struct PayloadStore {
    dir: PathBuf,
    writer: AtomicFileWriter,
}

impl PayloadStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove every payload from a previous run.
    pub fn clear(&self) -> Result<(), PersistError> {
        engine_info!("Removing old files from {:?}", self.dir);
        recreate_dir(&self.dir)
    }

    pub fn put(&self, ordinal: usize, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        self.writer.write(&payload_filename(ordinal), bytes)
    }

    /// Staged ordinals and their paths, in ordinal order. Files not named like
    /// a payload (such as in-flight temp files) are skipped.
    pub fn entries(&self) -> Result<Vec<(usize, PathBuf)>, PersistError> {
        let mut entries: Vec<(usize, PathBuf)> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                parse_ordinal(&path).map(|ordinal| (ordinal, path))
            })
            .collect();
        entries.sort_by_key(|(ordinal, _)| *ordinal);
        Ok(entries)
    }

    pub fn read(&self, ordinal: usize) -> Result<Vec<u8>, PersistError> {
        Ok(fs::read(self.dir.join(payload_filename(ordinal)))?)
    }

    pub fn list_all(&self) -> Result<Vec<StagedPayload>, PersistError> {
        self.entries()?
            .into_iter()
            .map(|(ordinal, path)| -> Result<StagedPayload, PersistError> {
                Ok(StagedPayload {
                    ordinal,
                    bytes: fs::read(path)?,
                })
            })
            .collect()
    }
}

/// Zero-padded so lexical and ordinal order agree.
pub fn payload_filename(ordinal: usize) -> String {
    format!("{ordinal:06}.{PAYLOAD_EXTENSION}")
}

fn parse_ordinal(path: &Path) -> Option<usize> {
    if path.extension()?.to_str()? != PAYLOAD_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}
