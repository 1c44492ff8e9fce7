use std::path::PathBuf;

use engine_logging::engine_info;

use crate::convert::Converter;
use crate::destination::DestinationStore;
use crate::error::HarvestError;
use crate::payload_store::PayloadStore;
use crate::records::{GeometryKind, RecordSchema};
use crate::workspace::{record_set_name, IntermediateWorkspace};
use crate::{HarvestEvent, ProgressSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub collection: String,
    pub chunks: usize,
    pub records: usize,
    pub schema: RecordSchema,
}

/// Converts every staged payload, then replaces the destination collection
/// with their union.
///
/// All conversion happens before the destination is touched, and the new
/// version only becomes visible on commit, so any failure leaves the previous
/// version in place.
pub struct MergeStage<'a> {
    workspace_dir: PathBuf,
    converter: &'a dyn Converter,
    geometry: GeometryKind,
    sink: &'a dyn ProgressSink,
}

impl<'a> MergeStage<'a> {
    pub fn new(
        workspace_dir: impl Into<PathBuf>,
        converter: &'a dyn Converter,
        geometry: GeometryKind,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            converter,
            geometry,
            sink,
        }
    }

    pub fn merge_all(
        &self,
        payloads: &PayloadStore,
        destination: &DestinationStore,
        collection: &str,
    ) -> Result<MergeSummary, HarvestError> {
        // Reject a bad name before doing any conversion work.
        destination.collection_path(collection)?;

        let workspace = IntermediateWorkspace::recreate(&self.workspace_dir)?;
        engine_info!("Saving features...");

        let mut schema: Option<RecordSchema> = None;
        let mut names = Vec::new();
        for (ordinal, path) in payloads.entries()? {
            let name = record_set_name(ordinal);
            engine_info!("Transferring {:?} to {:?} as {}", path, workspace.dir(), name);

            let bytes = payloads.read(ordinal)?;
            let set = self
                .converter
                .convert(&bytes, self.geometry)
                .map_err(|source| HarvestError::Conversion { ordinal, source })?;

            let expected = schema.get_or_insert_with(|| set.schema.clone());
            if *expected != set.schema {
                return Err(HarvestError::SchemaMismatch {
                    ordinal,
                    expected: Box::new(expected.clone()),
                    found: Box::new(set.schema),
                });
            }

            workspace.store(&name, &set)?;
            self.sink.emit(HarvestEvent::ChunkConverted {
                ordinal,
                records: set.records.len(),
            });
            names.push(name);
        }

        let schema = schema.unwrap_or_else(|| RecordSchema::empty(self.geometry));
        if destination.exists(collection)? {
            engine_info!("Replacing existing collection {} in {:?}", collection, destination.dir());
        }

        let mut builder = destination.begin_replace(collection, &schema)?;
        for name in &names {
            let set = workspace.load(name)?;
            builder.append(&set.records)?;
        }
        let records = builder.commit()?;

        engine_info!(
            "Merged {} chunks into {} ({} records)",
            names.len(),
            collection,
            records
        );
        self.sink.emit(HarvestEvent::MergeCompleted {
            collection: collection.to_string(),
            records,
        });

        Ok(MergeSummary {
            collection: collection.to_string(),
            chunks: names.len(),
            records,
            schema,
        })
    }
}
