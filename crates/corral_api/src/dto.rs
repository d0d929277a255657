use corral_domain::{MovementStats, Position, TagHistoryRecord, TagState};
use serde::Serialize;

fn pos_array(position: Position) -> [f64; 3] {
    [position.x, position.y, position.z]
}

/// One row of the `GET /api/tags` snapshot.
#[derive(Debug, Serialize)]
pub struct TagStateDto {
    pub uid: String,
    #[serde(rename = "deviceName")]
    pub device_name: Option<String>,
    pub pos: [f64; 3],
    pub online: bool,
    #[serde(rename = "lastSeen")]
    pub last_seen: i64,
}

impl From<TagState> for TagStateDto {
    fn from(state: TagState) -> Self {
        Self {
            uid: state.uid,
            device_name: state.device_name,
            pos: pos_array(state.position),
            online: state.online,
            last_seen: state.last_seen_ms,
        }
    }
}

/// One row of the `GET /api/history` window.
#[derive(Debug, Serialize)]
pub struct HistoryRecordDto {
    pub uid: String,
    #[serde(rename = "deviceName")]
    pub device_name: Option<String>,
    pub pos: [f64; 3],
    pub time: i64,
}

impl From<TagHistoryRecord> for HistoryRecordDto {
    fn from(record: TagHistoryRecord) -> Self {
        Self {
            uid: record.uid,
            device_name: record.device_name,
            pos: pos_array(record.position),
            time: record.timestamp_ms,
        }
    }
}

/// Per-tag value in the `GET /api/stats` map.
#[derive(Debug, Serialize)]
pub struct MovementStatsDto {
    #[serde(rename = "deviceName")]
    pub device_name: Option<String>,
    #[serde(rename = "totalDistance")]
    pub total_distance: f64,
    #[serde(rename = "movingTimeMinutes")]
    pub moving_time_minutes: f64,
}

impl From<MovementStats> for MovementStatsDto {
    fn from(stats: MovementStats) -> Self {
        Self {
            device_name: stats.device_name,
            total_distance: stats.total_distance_meters,
            moving_time_minutes: stats.moving_time_minutes,
        }
    }
}

/// Liveness banner served at `GET /`.
#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
    pub udp_port: u16,
}

/// Body served at `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
