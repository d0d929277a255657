/// Tag position in meters within the site coordinate frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Ground-plane distance to `other`. Height is ignored.
    pub fn planar_distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One accepted telemetry datagram, consumed immediately by recording and fan-out
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEvent {
    pub uid: String,
    pub device_name: Option<String>,
    pub position: Position,
    pub timestamp_ms: i64,
}

/// Latest known state of a tag. One live row per uid, overwritten in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct TagState {
    pub uid: String,
    pub device_name: Option<String>,
    pub position: Position,
    pub last_seen_ms: i64,
    pub online: bool,
}

/// Immutable history row, one per accepted event
#[derive(Debug, Clone, PartialEq)]
pub struct TagHistoryRecord {
    pub uid: String,
    pub device_name: Option<String>,
    pub position: Position,
    pub timestamp_ms: i64,
}

/// Movement metrics derived from a history window, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct MovementStats {
    pub device_name: Option<String>,
    pub total_distance_meters: f64,
    pub moving_time_minutes: f64,
}
