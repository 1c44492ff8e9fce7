use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::MergeError;
use crate::records::{Record, RecordSchema};

const COLLECTION_EXTENSION: &str = "jsonl";

/// First line of a collection file.
#[derive(Debug, Serialize, Deserialize)]
struct CollectionHeader {
    collection: String,
    schema: RecordSchema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCollection {
    pub schema: RecordSchema,
    pub records: Vec<Record>,
}

/// Directory of named collections, one JSON Lines file each: a header line
/// with the schema, then one record per line.
#[derive(Debug, Clone)]
pub struct DestinationStore {
    dir: PathBuf,
}

impl DestinationStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MergeError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| MergeError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn collection_path(&self, name: &str) -> Result<PathBuf, MergeError> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(MergeError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{COLLECTION_EXTENSION}")))
    }

    pub fn exists(&self, name: &str) -> Result<bool, MergeError> {
        Ok(self.collection_path(name)?.is_file())
    }

    pub fn read_schema(&self, name: &str) -> Result<RecordSchema, MergeError> {
        let mut lines = self.open_lines(name)?;
        Ok(read_header(name, &mut lines)?.schema)
    }

    pub fn record_count(&self, name: &str) -> Result<usize, MergeError> {
        let mut lines = self.open_lines(name)?;
        read_header(name, &mut lines)?;
        let mut count = 0;
        for line in lines {
            let (_, line) = line?;
            if !line.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn read_collection(&self, name: &str) -> Result<StoredCollection, MergeError> {
        let mut lines = self.open_lines(name)?;
        let header = read_header(name, &mut lines)?;
        let mut records = Vec::new();
        for line in lines {
            let (number, line) = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|_| MergeError::Corrupt {
                name: name.to_string(),
                line: number,
            })?;
            records.push(record);
        }
        Ok(StoredCollection {
            schema: header.schema,
            records,
        })
    }

    /// Start building a new version of `name`. The current version, if any,
    /// stays readable until [`CollectionBuilder::commit`] swaps it out.
    pub fn begin_replace(
        &self,
        name: &str,
        schema: &RecordSchema,
    ) -> Result<CollectionBuilder, MergeError> {
        let target = self.collection_path(name)?;
        let tmp = NamedTempFile::new_in(&self.dir).map_err(|e| MergeError::io(&self.dir, e))?;
        let mut builder = CollectionBuilder {
            target,
            writer: BufWriter::new(tmp),
            records: 0,
        };
        let header = CollectionHeader {
            collection: name.to_string(),
            schema: schema.clone(),
        };
        builder.write_line(&header)?;
        Ok(builder)
    }

    fn open_lines(
        &self,
        name: &str,
    ) -> Result<impl Iterator<Item = Result<(usize, String), MergeError>>, MergeError> {
        let path = self.collection_path(name)?;
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MergeError::Missing {
                    name: name.to_string(),
                }
            } else {
                MergeError::io(&path, e)
            }
        })?;
        Ok(BufReader::new(file)
            .lines()
            .enumerate()
            .map(move |(index, line)| {
                line.map(|text| (index + 1, text))
                    .map_err(|e| MergeError::io(&path, e))
            }))
    }
}

fn read_header(
    name: &str,
    lines: &mut impl Iterator<Item = Result<(usize, String), MergeError>>,
) -> Result<CollectionHeader, MergeError> {
    let corrupt = || MergeError::Corrupt {
        name: name.to_string(),
        line: 1,
    };
    let (_, line) = lines.next().ok_or_else(corrupt)??;
    serde_json::from_str(&line).map_err(|_| corrupt())
}

/// New collection version under construction in a temp file next to the
/// target. Dropping it without committing discards the build.
pub struct CollectionBuilder {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
    records: usize,
}

impl CollectionBuilder {
    pub fn append(&mut self, records: &[Record]) -> Result<(), MergeError> {
        for record in records {
            self.write_line(record)?;
            self.records += 1;
        }
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush, sync and rename over the target in one step.
    pub fn commit(self) -> Result<usize, MergeError> {
        let Self {
            target,
            writer,
            records,
        } = self;
        let tmp = writer
            .into_inner()
            .map_err(|e| MergeError::io(&target, e.into_error()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| MergeError::io(&target, e))?;
        tmp.persist(&target)
            .map_err(|e| MergeError::io(&target, e.error))?;
        Ok(records)
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<(), MergeError> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| MergeError::io(&self.target, e))
    }
}
