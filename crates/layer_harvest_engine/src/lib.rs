//! Layer harvest engine: HTTP extraction, staging, conversion and merge.
mod clock;
mod config;
mod convert;
mod destination;
mod error;
mod extract;
mod fetch;
mod merge;
mod payload_store;
mod persist;
mod pipeline;
mod records;
mod resolve;
mod types;
mod workspace;

pub use clock::{Clock, TokioClock};
pub use config::HarvestConfig;
pub use convert::{Converter, FeatureJsonConverter};
pub use destination::{CollectionBuilder, DestinationStore, StoredCollection};
pub use error::{ConversionError, HarvestError, MergeError, ResolutionError};
pub use extract::{ExtractionClient, ExtractionSettings, DEFAULT_REQUEST_PAUSE};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use merge::{MergeStage, MergeSummary};
pub use payload_store::{payload_filename, PayloadStore, StagedPayload};
pub use persist::{ensure_dir, recreate_dir, AtomicFileWriter, PersistError};
pub use pipeline::{Harvester, RunSummary};
pub use records::{ConvertedRecordSet, FieldDef, GeometryKind, Record, RecordSchema};
pub use resolve::ServiceResolver;
pub use types::{
    AttemptFailure, FailureKind, FetchError, HarvestEvent, HttpReply, NullProgressSink,
    ProgressSink, RawPayload,
};
pub use workspace::{record_set_name, IntermediateWorkspace};
