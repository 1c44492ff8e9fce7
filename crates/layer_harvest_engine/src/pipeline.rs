use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn, minutes};
use layer_harvest_core::{plan, EffectivePageSize, Endpoint, PageSizeSource};

use crate::clock::{Clock, TokioClock};
use crate::config::HarvestConfig;
use crate::convert::{Converter, FeatureJsonConverter};
use crate::destination::DestinationStore;
use crate::error::HarvestError;
use crate::extract::ExtractionClient;
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::merge::{MergeStage, MergeSummary};
use crate::payload_store::PayloadStore;
use crate::resolve::ServiceResolver;
use crate::{HarvestEvent, NullProgressSink, ProgressSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id_field: String,
    pub page_size: EffectivePageSize,
    pub chunks: usize,
    /// Requests issued for chunks, retries included.
    pub requests: u64,
    pub merge: MergeSummary,
    pub elapsed: Duration,
}

/// One full extraction: resolve, plan, extract every chunk in order, merge.
pub struct Harvester {
    config: HarvestConfig,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    converter: Arc<dyn Converter>,
    sink: Arc<dyn ProgressSink>,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone()).map_err(HarvestError::Client)?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            clock: Arc::new(TokioClock),
            converter: Arc::new(FeatureJsonConverter),
            sink: Arc::new(NullProgressSink),
        })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        let started = self.clock.now();
        let config = &self.config;
        let endpoint = Endpoint::parse(&config.endpoint)?;
        config.check_directories()?;
        let destination = DestinationStore::open(&config.destination_dir)?;
        destination.collection_path(&config.collection)?;

        engine_info!("Getting started on REST extraction for {}", endpoint);
        let payloads = PayloadStore::open(&config.staging_dir)?;
        payloads.clear()?;

        let resolver = ServiceResolver::new(self.fetcher.as_ref());
        let server_max = resolver.resolve_page_size(&endpoint).await?;
        let manifest = resolver.resolve_manifest(&endpoint).await?;

        let page_size = EffectivePageSize::resolve(server_max, config.page_size_override);
        if page_size.source == PageSizeSource::Override {
            engine_info!(
                "Using a page size of {} instead of the server limit of {}",
                page_size.size,
                server_max
            );
        }
        if page_size.exceeds_server_max() {
            engine_warn!(
                "Page size {} is above the server limit of {}; the server may truncate responses",
                page_size.size,
                server_max
            );
        }

        let plan = plan(&manifest, page_size.size);
        let estimated_min = plan.estimated_min_duration(config.extraction.request_pause);
        engine_info!(
            "The server has an extraction limit of {} and a total of {} records",
            server_max,
            plan.total_records()
        );
        engine_info!("This will take {} iterations", plan.chunk_count());
        engine_info!(
            "The minimum processing time will be {} minutes",
            minutes(estimated_min)
        );
        self.sink.emit(HarvestEvent::PlanReady {
            server_max: server_max.get(),
            page_size: page_size.size.get(),
            total_records: plan.total_records(),
            chunk_count: plan.chunk_count(),
            estimated_min,
        });

        let client = ExtractionClient::new(
            self.fetcher.as_ref(),
            self.clock.as_ref(),
            self.sink.as_ref(),
            &config.extraction,
        );
        let mut requests = 0u64;
        for chunk in plan.chunks() {
            engine_info!(
                "Working on {:06} out of {} records",
                chunk.records_through,
                plan.total_records()
            );
            self.sink.emit(HarvestEvent::ChunkStarted {
                ordinal: chunk.ordinal,
                records_through: chunk.records_through,
                total_records: plan.total_records(),
            });
            let payload = client
                .extract_into(chunk, manifest.id_field(), &endpoint, &payloads)
                .await?;
            requests += u64::from(payload.attempts);
        }

        let merge = MergeStage::new(
            &config.workspace_dir,
            self.converter.as_ref(),
            config.geometry,
            self.sink.as_ref(),
        )
        .merge_all(&payloads, &destination, &config.collection)?;

        let elapsed = self.clock.now().saturating_duration_since(started);
        engine_info!("Done! This routine took {} minutes", minutes(elapsed));

        Ok(RunSummary {
            id_field: manifest.id_field().to_string(),
            page_size,
            chunks: plan.chunk_count(),
            requests,
            merge,
            elapsed,
        })
    }
}
