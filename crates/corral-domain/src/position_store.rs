use crate::error::DomainResult;
use crate::types::{TagHistoryRecord, TagState, TelemetryEvent};

/// Storage contract for tag state and history.
///
/// The contract is synchronous: the ingest loop calls it inline from its
/// receive thread, and async callers go through the blocking pool.
/// Infrastructure adapters (in-memory, or an external engine) implement
/// this trait.
#[cfg_attr(test, mockall::automock)]
pub trait PositionStore: Send + Sync {
    /// Insert or overwrite the live row for the event's uid, forcing it online.
    ///
    /// A later arrival always wins, regardless of its producer timestamp.
    /// An event without a device name keeps the row's existing name.
    fn upsert_state(&self, event: &TelemetryEvent) -> DomainResult<()>;

    /// Append one immutable history row. No deduplication, no reordering.
    fn append_history(&self, event: &TelemetryEvent) -> DomainResult<()>;

    /// Flip the given uids offline, re-checking staleness against `cutoff_ms`.
    ///
    /// Rows whose `last_seen_ms` moved to or past the cutoff after the
    /// caller selected them are left untouched. Returns how many rows
    /// actually flipped. The batch is applied atomically.
    fn mark_offline(&self, uids: &[String], cutoff_ms: i64) -> DomainResult<usize>;

    /// Current state of every known tag.
    fn snapshot(&self) -> DomainResult<Vec<TagState>>;

    /// History rows with `timestamp_ms` in `[start_ms, end_ms]` inclusive,
    /// ordered by `(timestamp_ms, uid)`.
    fn history_range(&self, start_ms: i64, end_ms: i64) -> DomainResult<Vec<TagHistoryRecord>>;
}
