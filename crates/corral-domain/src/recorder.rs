use std::sync::Arc;

use tracing::{debug, error};

use crate::position_store::PositionStore;
use crate::types::TelemetryEvent;

/// Write-through recording of accepted telemetry.
///
/// The state upsert and the history append are attempted independently, and
/// a failure of either is logged and discarded. The ingest loop must keep
/// receiving no matter what the store does.
pub struct TelemetryRecorder {
    store: Arc<dyn PositionStore>,
}

impl TelemetryRecorder {
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self { store }
    }

    /// Record one accepted event: live row overwrite plus history append.
    pub fn record(&self, event: &TelemetryEvent) {
        if let Err(e) = self.store.upsert_state(event) {
            error!(uid = %event.uid, error = %e, "Failed to upsert tag state");
        }

        if let Err(e) = self.store.append_history(event) {
            error!(uid = %event.uid, error = %e, "Failed to append tag history");
        }

        debug!(
            uid = %event.uid,
            timestamp_ms = event.timestamp_ms,
            "Recorded telemetry event"
        );
    }
}
