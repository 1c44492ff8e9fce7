//! Layer harvest core: pure planning and retry logic, no IO.
mod backoff;
mod classify;
mod endpoint;
mod manifest;
mod plan;

pub use backoff::{Backoff, RetryDecision, RetryPolicy, DEFAULT_BASE_DELAY};
pub use classify::{ResponseClass, SoftErrorRule, QUERY_ERROR_SENTINEL};
pub use endpoint::{range_filter, Endpoint, EndpointError, ALL_FIELDS};
pub use manifest::{IdentifierManifest, ObjectId};
pub use plan::{plan, Chunk, EffectivePageSize, ExtractionPlan, PageSizeSource};
