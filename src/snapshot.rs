//! Shared holder of the latest refresh result

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::errors::ExporterError;
use crate::models::{Snapshot, TrackedPosition};

/// Latest snapshot, replaced as a whole on every refresh.
///
/// Readers get an `Arc` to an immutable snapshot and never hold the lock while
/// rendering.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current snapshot
    pub async fn get(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Store the outcome of a refresh attempt that finished at `at`.
    ///
    /// On failure the positions of the previous snapshot are carried over.
    pub async fn record(
        &self,
        outcome: Result<Vec<TrackedPosition>, ExporterError>,
        at: DateTime<Utc>,
        duration: Duration,
    ) -> Arc<Snapshot> {
        let mut current = self.current.write().await;
        let next = Arc::new(match outcome {
            Ok(positions) => Snapshot {
                positions,
                last_refresh: Some(at),
                refresh_duration: duration,
                last_error: None,
            },
            Err(e) => Snapshot {
                positions: current.positions.clone(),
                last_refresh: Some(at),
                refresh_duration: duration,
                last_error: Some(e.to_string()),
            },
        });
        *current = next.clone();
        next
    }
}
