use std::num::NonZeroUsize;
use std::time::Duration;

use crate::{IdentifierManifest, ObjectId};

/// One identifier-range window, extracted by a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in extraction order.
    pub ordinal: usize,
    pub min_id: ObjectId,
    pub max_id: ObjectId,
    /// Number of manifest identifiers inside the window.
    pub len: usize,
    /// Cumulative manifest position once this chunk is done.
    pub records_through: usize,
}

/// Where the effective page size came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeSource {
    Server,
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePageSize {
    pub size: NonZeroUsize,
    pub source: PageSizeSource,
    pub server_max: NonZeroUsize,
}

impl EffectivePageSize {
    /// An operator override wins even above the advertised maximum: some servers
    /// advertise more than they can reliably serve.
    pub fn resolve(server_max: NonZeroUsize, operator_override: Option<NonZeroUsize>) -> Self {
        match operator_override {
            Some(size) => Self {
                size,
                source: PageSizeSource::Override,
                server_max,
            },
            None => Self {
                size: server_max,
                source: PageSizeSource::Server,
                server_max,
            },
        }
    }

    pub fn exceeds_server_max(&self) -> bool {
        self.size > self.server_max
    }
}

/// Ordered chunk partition of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPlan {
    chunks: Vec<Chunk>,
    total_records: usize,
    page_size: NonZeroUsize,
}

impl ExtractionPlan {
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Lower bound on wall-clock time: one courtesy pause per chunk.
    pub fn estimated_min_duration(&self, request_pause: Duration) -> Duration {
        let count = u32::try_from(self.chunks.len()).unwrap_or(u32::MAX);
        request_pause.saturating_mul(count)
    }
}

/// Walk the manifest in strides of `page_size`; the last stride may be short.
pub fn plan(manifest: &IdentifierManifest, page_size: NonZeroUsize) -> ExtractionPlan {
    let mut records_through = 0;
    let chunks = manifest
        .ids()
        .chunks(page_size.get())
        .enumerate()
        .filter_map(|(ordinal, stride)| {
            let (first, last) = (stride.first()?, stride.last()?);
            records_through += stride.len();
            Some(Chunk {
                ordinal,
                min_id: *first,
                max_id: *last,
                len: stride.len(),
                records_through,
            })
        })
        .collect();

    ExtractionPlan {
        chunks,
        total_records: manifest.len(),
        page_size,
    }
}
