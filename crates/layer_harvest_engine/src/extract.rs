use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use layer_harvest_core::{
    Chunk, Endpoint, ResponseClass, RetryDecision, RetryPolicy, SoftErrorRule,
};

use crate::clock::Clock;
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::payload_store::PayloadStore;
use crate::{AttemptFailure, HarvestEvent, ProgressSink, RawPayload};

pub const DEFAULT_REQUEST_PAUSE: Duration = Duration::from_secs(10);

/// Settings for the per-chunk request loop.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub out_fields: String,
    /// Courtesy pause after every successful chunk.
    pub request_pause: Duration,
    pub retry: RetryPolicy,
    pub soft_errors: SoftErrorRule,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            out_fields: layer_harvest_core::ALL_FIELDS.to_string(),
            request_pause: DEFAULT_REQUEST_PAUSE,
            retry: RetryPolicy::default(),
            soft_errors: SoftErrorRule::default(),
        }
    }
}

/// Issues one windowed query per chunk, retrying the identical request with
/// doubling backoff until it succeeds or the retry policy gives up.
pub struct ExtractionClient<'a> {
    fetcher: &'a dyn Fetcher,
    clock: &'a dyn Clock,
    sink: &'a dyn ProgressSink,
    settings: &'a ExtractionSettings,
}

impl<'a> ExtractionClient<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        clock: &'a dyn Clock,
        sink: &'a dyn ProgressSink,
        settings: &'a ExtractionSettings,
    ) -> Self {
        Self {
            fetcher,
            clock,
            sink,
            settings,
        }
    }

    pub async fn extract(
        &self,
        chunk: &Chunk,
        id_field: &str,
        endpoint: &Endpoint,
    ) -> Result<RawPayload, HarvestError> {
        let url = endpoint.chunk_query_url(chunk, id_field, &self.settings.out_fields);
        let started = self.clock.now();
        let mut backoff = self.settings.retry.backoff();

        loop {
            engine_debug!("Querying chunk {} at {}", chunk.ordinal, url);
            let failure = match self.fetcher.get(&url).await {
                Ok(reply) => match self.settings.soft_errors.classify(reply.status, &reply.body) {
                    ResponseClass::Success => {
                        self.clock.sleep(self.settings.request_pause).await;
                        return Ok(RawPayload {
                            ordinal: chunk.ordinal,
                            bytes: reply.body,
                            attempts: backoff.failures() + 1,
                        });
                    }
                    ResponseClass::HardFailure { status } => {
                        engine_warn!("Server answered with status {} for {}", status, url);
                        AttemptFailure::HttpStatus(status)
                    }
                    ResponseClass::SoftFailure { status } => {
                        engine_warn!(
                            "Server had response code {}, but returned query was empty: {}",
                            status,
                            url
                        );
                        AttemptFailure::SoftServerError { status }
                    }
                },
                Err(err) => {
                    engine_warn!("Request for chunk {} did not complete: {}", chunk.ordinal, err);
                    AttemptFailure::Transport(err)
                }
            };

            let elapsed = self.clock.now().saturating_duration_since(started);
            match self.settings.retry.on_failure(&mut backoff, elapsed) {
                RetryDecision::RetryAfter { delay, attempts } => {
                    engine_warn!(
                        "Response not OK ({}), sleeping for {} seconds before retrying chunk {}",
                        failure,
                        delay.as_secs(),
                        chunk.ordinal
                    );
                    self.sink.emit(HarvestEvent::RetryScheduled {
                        ordinal: chunk.ordinal,
                        attempt: attempts,
                        delay,
                        failure,
                    });
                    self.clock.sleep(delay).await;
                    engine_info!("Trying query url again: {}", url);
                }
                RetryDecision::GiveUp { attempts } => {
                    return Err(HarvestError::ExtractionAborted {
                        ordinal: chunk.ordinal,
                        attempts,
                        last_failure: failure,
                    });
                }
            }
        }
    }

    /// Extract a chunk and write its payload under the chunk ordinal.
    pub async fn extract_into(
        &self,
        chunk: &Chunk,
        id_field: &str,
        endpoint: &Endpoint,
        store: &PayloadStore,
    ) -> Result<RawPayload, HarvestError> {
        let payload = self.extract(chunk, id_field, endpoint).await?;
        store.put(payload.ordinal, &payload.bytes)?;
        self.sink.emit(HarvestEvent::ChunkStaged {
            ordinal: payload.ordinal,
            bytes: payload.bytes.len() as u64,
        });
        Ok(payload)
    }
}
