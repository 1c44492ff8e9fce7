use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("directory {path:?} missing or not writable: {message}")]
    Dir { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {path:?}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn dir_error(dir: &Path, message: impl ToString) -> PersistError {
    PersistError::Dir {
        path: dir.to_path_buf(),
        message: message.to_string(),
    }
}

/// Ensure a directory exists; create if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| dir_error(dir, e))?;
        if !meta.is_dir() {
            return Err(dir_error(dir, "path is not a directory"));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| dir_error(dir, e))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| dir_error(dir, e))?;
    Ok(())
}

/// Delete a directory with everything in it, then create it empty.
pub fn recreate_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(dir_error(dir, err)),
    }
    ensure_dir(dir)
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| dir_error(&self.dir, e))?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // The rename replaces any previous file of the same name.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
