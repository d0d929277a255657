pub mod broadcast_hub;
pub mod error;
pub mod in_memory_position_store;
pub mod position_store;
pub mod query;
pub mod recorder;
pub mod stats;
pub mod sweeper;
pub mod telemetry;
pub mod types;

pub use broadcast_hub::{BroadcastHub, SessionId, SubscriberSession};
pub use error::{DeliveryError, DomainError, DomainResult, TelemetryParseError};
pub use in_memory_position_store::InMemoryPositionStore;
pub use position_store::PositionStore;
pub use query::TagQueryService;
pub use recorder::TelemetryRecorder;
pub use stats::aggregate_movement;
pub use sweeper::HibernationSweeper;
pub use telemetry::parse_telemetry;
pub use types::{MovementStats, Position, TagHistoryRecord, TagState, TelemetryEvent};
