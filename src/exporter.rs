//! Periodic refresh of icebreaker positions

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    client::PayloadSource,
    config::DigitrafficConfig,
    errors::ExporterError,
    extract::{extract_locations, extract_metadata},
    models::{AllowList, Snapshot, TrackedPosition},
    reconcile::select_positions,
    snapshot::SnapshotCache,
};

/// Fetches both Digitraffic payloads, reconciles them and publishes the
/// result into the shared [`SnapshotCache`].
pub struct Exporter<C> {
    client: C,
    config: DigitrafficConfig,
    targets: AllowList,
    cache: Arc<SnapshotCache>,
}

impl<C: PayloadSource> Exporter<C> {
    pub fn new(
        client: C,
        config: DigitrafficConfig,
        targets: AllowList,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            client,
            config,
            targets,
            cache,
        }
    }

    /// Refresh immediately and then on every interval tick until cancelled.
    ///
    /// Refreshes run one at a time; a refresh that overruns the interval makes
    /// the loop skip the missed ticks.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.refresh_interval.as_secs(),
            vessels = self.targets.len(),
            "refresh loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("refresh loop shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }
    }

    /// Run one refresh cycle and store its outcome
    pub async fn refresh(&self) -> Arc<Snapshot> {
        let start = Instant::now();
        let outcome = self.fetch_positions().await;
        let duration = start.elapsed();

        match &outcome {
            Ok(positions) => info!(
                count = positions.len(),
                duration_ms = duration.as_millis() as u64,
                "refreshed icebreaker positions"
            ),
            Err(e) => error!(error = %e, "refresh failed"),
        }

        self.cache.record(outcome, Utc::now(), duration).await
    }

    /// Fetch vessels and locations within one shared timeout and reconcile
    pub async fn fetch_positions(&self) -> Result<Vec<TrackedPosition>, ExporterError> {
        let budget = self.config.request_timeout;
        let (vessels, locations) = timeout(budget, self.fetch_payloads())
            .await
            .map_err(|_| ExporterError::Timeout(budget))??;

        let metadata = extract_metadata(&vessels);
        let locations = extract_locations(&locations);
        let positions = select_positions(&metadata, &locations, &self.targets);

        if positions.is_empty() {
            return Err(ExporterError::NoPositions);
        }
        Ok(positions)
    }

    async fn fetch_payloads(&self) -> Result<(Value, Value), ExporterError> {
        let vessels = self
            .client
            .fetch_json(&self.config.vessels_url)
            .await
            .map_err(ExporterError::fetching("vessels"))?;
        let locations = self
            .client
            .fetch_json(&self.config.locations_url)
            .await
            .map_err(ExporterError::fetching("locations"))?;
        Ok((vessels, locations))
    }
}
