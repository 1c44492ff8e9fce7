use std::fs;
use std::path::{Path, PathBuf};

use crate::persist::{recreate_dir, AtomicFileWriter, PersistError};
use crate::records::ConvertedRecordSet;

/// Scratch directory holding one converted record set per chunk.
#[derive(Debug)]
pub struct IntermediateWorkspace {
    dir: PathBuf,
    writer: AtomicFileWriter,
}

impl IntermediateWorkspace {
    /// Start from an empty directory so sets from an earlier run cannot leak in.
    pub fn recreate(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        recreate_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self, name: &str, set: &ConvertedRecordSet) -> Result<PathBuf, PersistError> {
        let content = serde_json::to_vec(set).map_err(|source| PersistError::Serialize {
            name: name.to_string(),
            source,
        })?;
        self.writer.write(&set_filename(name), &content)
    }

    pub fn load(&self, name: &str) -> Result<ConvertedRecordSet, PersistError> {
        let path = self.dir.join(set_filename(name));
        let content = fs::read(&path)?;
        serde_json::from_slice(&content).map_err(|source| PersistError::Deserialize { path, source })
    }
}

/// `chunk_000003` for ordinal 3.
pub fn record_set_name(ordinal: usize) -> String {
    format!("chunk_{ordinal:06}")
}

fn set_filename(name: &str) -> String {
    format!("{name}.json")
}
