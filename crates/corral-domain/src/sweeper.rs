use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DomainResult;
use crate::position_store::PositionStore;

/// Stale-tag detection over the position store.
///
/// A tag goes offline when its last event is older than the timeout. It
/// only comes back online through a newly ingested event.
pub struct HibernationSweeper {
    store: Arc<dyn PositionStore>,
    timeout_ms: i64,
}

impl HibernationSweeper {
    pub fn new(store: Arc<dyn PositionStore>, timeout_ms: i64) -> Self {
        Self { store, timeout_ms }
    }

    /// Run one sweep against the given wall clock.
    ///
    /// Returns how many tags were flipped offline. A sweep that finds no
    /// stale tags issues no write at all.
    pub fn sweep_once(&self, now_ms: i64) -> DomainResult<usize> {
        let cutoff_ms = now_ms - self.timeout_ms;

        // 1. Select online tags that have gone stale
        let stale: Vec<String> = self
            .store
            .snapshot()?
            .into_iter()
            .filter(|state| state.online && state.last_seen_ms < cutoff_ms)
            .map(|state| state.uid)
            .collect();

        // 2. Nothing stale, nothing to write
        if stale.is_empty() {
            debug!("No stale tags");
            return Ok(0);
        }

        // 3. One batched flip, re-checked against the cutoff inside the store
        let flipped = self.store.mark_offline(&stale, cutoff_ms)?;
        info!(candidates = stale.len(), flipped, "Marked stale tags offline");
        Ok(flipped)
    }
}
