use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::DomainResult;
use crate::position_store::PositionStore;
use crate::types::{TagHistoryRecord, TagState, TelemetryEvent};

#[derive(Default)]
struct StoreInner {
    states: HashMap<String, TagState>,
    history: Vec<TagHistoryRecord>,
}

/// In-memory implementation of PositionStore over a locked map and log
pub struct InMemoryPositionStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }
}

impl Default for InMemoryPositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionStore for InMemoryPositionStore {
    fn upsert_state(&self, event: &TelemetryEvent) -> DomainResult<()> {
        let mut inner = self.inner.write();
        let state = inner
            .states
            .entry(event.uid.clone())
            .or_insert_with(|| TagState {
                uid: event.uid.clone(),
                device_name: None,
                position: event.position,
                last_seen_ms: event.timestamp_ms,
                online: true,
            });

        if event.device_name.is_some() {
            state.device_name = event.device_name.clone();
        }
        state.position = event.position;
        state.last_seen_ms = event.timestamp_ms;
        state.online = true;
        Ok(())
    }

    fn append_history(&self, event: &TelemetryEvent) -> DomainResult<()> {
        let mut inner = self.inner.write();
        inner.history.push(TagHistoryRecord {
            uid: event.uid.clone(),
            device_name: event.device_name.clone(),
            position: event.position,
            timestamp_ms: event.timestamp_ms,
        });
        Ok(())
    }

    fn mark_offline(&self, uids: &[String], cutoff_ms: i64) -> DomainResult<usize> {
        let mut inner = self.inner.write();
        let mut flipped = 0;
        for uid in uids {
            if let Some(state) = inner.states.get_mut(uid) {
                if state.online && state.last_seen_ms < cutoff_ms {
                    state.online = false;
                    flipped += 1;
                }
            }
        }
        Ok(flipped)
    }

    fn snapshot(&self) -> DomainResult<Vec<TagState>> {
        let inner = self.inner.read();
        let mut rows: Vec<TagState> = inner.states.values().cloned().collect();
        rows.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(rows)
    }

    fn history_range(&self, start_ms: i64, end_ms: i64) -> DomainResult<Vec<TagHistoryRecord>> {
        let inner = self.inner.read();
        let mut rows: Vec<TagHistoryRecord> = inner
            .history
            .iter()
            .filter(|row| row.timestamp_ms >= start_ms && row.timestamp_ms <= end_ms)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.timestamp_ms
                .cmp(&b.timestamp_ms)
                .then_with(|| a.uid.cmp(&b.uid))
        });
        Ok(rows)
    }
}
