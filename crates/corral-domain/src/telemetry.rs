use serde::Deserialize;

use crate::error::TelemetryParseError;
use crate::types::{Position, TelemetryEvent};

/// Wire shape of one tag datagram:
/// `{"uid": "...", "deviceName": "...", "data": {"pos": [x, y, z], "time": 1700000000000}}`
///
/// Fields beyond these are accepted and ignored.
#[derive(Debug, Deserialize)]
struct TelemetryWire {
    uid: String,
    #[serde(rename = "deviceName")]
    device_name: Option<String>,
    data: TelemetryData,
}

#[derive(Debug, Deserialize)]
struct TelemetryData {
    pos: Option<Vec<f64>>,
    time: i64,
}

/// Decode and validate a single datagram payload.
///
/// Rejects payloads that are not UTF-8 JSON of the wire shape, carry an
/// empty uid, or carry no position array. Missing trailing position
/// components default to 0.0.
pub fn parse_telemetry(payload: &[u8]) -> Result<TelemetryEvent, TelemetryParseError> {
    let text = std::str::from_utf8(payload)?;
    let wire: TelemetryWire = serde_json::from_str(text)?;

    if wire.uid.is_empty() {
        return Err(TelemetryParseError::EmptyUid);
    }

    let pos = wire.data.pos.ok_or(TelemetryParseError::MissingPosition)?;
    let position = Position::new(
        pos.first().copied().unwrap_or(0.0),
        pos.get(1).copied().unwrap_or(0.0),
        pos.get(2).copied().unwrap_or(0.0),
    );

    Ok(TelemetryEvent {
        uid: wire.uid,
        device_name: wire.device_name,
        position,
        timestamp_ms: wire.data.time,
    })
}
