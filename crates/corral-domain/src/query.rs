use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{DomainError, DomainResult};
use crate::position_store::PositionStore;
use crate::stats::aggregate_movement;
use crate::types::{MovementStats, TagHistoryRecord, TagState};

/// Read-side queries over the position store.
///
/// The store contract is synchronous, so every call is moved onto the
/// blocking pool before it touches the store.
pub struct TagQueryService {
    store: Arc<dyn PositionStore>,
}

impl TagQueryService {
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self { store }
    }

    /// Current state of every known tag.
    pub async fn tags(&self) -> DomainResult<Vec<TagState>> {
        let store = self.store.clone();
        run_blocking(move || store.snapshot()).await
    }

    /// Raw history rows inside the window, in time order.
    pub async fn history(&self, start_ms: i64, end_ms: i64) -> DomainResult<Vec<TagHistoryRecord>> {
        let store = self.store.clone();
        run_blocking(move || store.history_range(start_ms, end_ms)).await
    }

    /// Movement statistics per tag over the window.
    pub async fn movement_stats(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> DomainResult<BTreeMap<String, MovementStats>> {
        let store = self.store.clone();
        run_blocking(move || {
            let records = store.history_range(start_ms, end_ms)?;
            Ok(aggregate_movement(&records))
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> DomainResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DomainResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(DomainError::StoreError(anyhow::anyhow!(
            "Blocking store task failed: {e}"
        ))),
    }
}
