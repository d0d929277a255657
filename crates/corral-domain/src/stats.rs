use std::collections::BTreeMap;

use crate::types::{MovementStats, TagHistoryRecord};

/// Consecutive records further apart than this are a tracking gap and
/// contribute to neither distance nor moving time.
pub const GAP_THRESHOLD_MS: i64 = 5_000;

/// Speeds at or below this many meters per second are positioning jitter,
/// not movement.
pub const NOISE_SPEED_THRESHOLD: f64 = 0.05;

/// Aggregate per-tag movement metrics over a history window.
///
/// `records` must be ordered by `(timestamp_ms, uid)` as returned by
/// `PositionStore::history_range`. Tags with fewer than two records in the
/// window are omitted from the result.
pub fn aggregate_movement(records: &[TagHistoryRecord]) -> BTreeMap<String, MovementStats> {
    let mut grouped: BTreeMap<&str, Vec<&TagHistoryRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.uid.as_str()).or_default().push(record);
    }

    let mut stats = BTreeMap::new();
    for (uid, group) in grouped {
        if group.len() < 2 {
            continue;
        }

        let mut total_distance = 0.0_f64;
        let mut moving_ms = 0_i64;
        for pair in group.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);

            let dt_ms = curr.timestamp_ms - prev.timestamp_ms;
            if dt_ms <= 0 || dt_ms > GAP_THRESHOLD_MS {
                continue;
            }

            let distance = prev.position.planar_distance(&curr.position);
            let speed = distance / (dt_ms as f64 / 1000.0);
            if speed > NOISE_SPEED_THRESHOLD {
                total_distance += distance;
                moving_ms += dt_ms;
            }
        }

        stats.insert(
            uid.to_string(),
            MovementStats {
                device_name: group[0].device_name.clone(),
                total_distance_meters: round_two(total_distance),
                moving_time_minutes: round_two(moving_ms as f64 / 60_000.0),
            },
        );
    }

    stats
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn record(uid: &str, x: f64, y: f64, timestamp_ms: i64) -> TagHistoryRecord {
        TagHistoryRecord {
            uid: uid.to_string(),
            device_name: Some(format!("{uid}-name")),
            position: Position::new(x, y, 0.0),
            timestamp_ms,
        }
    }

    #[test]
    fn test_aggregate_distance_and_moving_time() {
        // One meter of real movement, one stationary second, one gap.
        let records = vec![
            record("T1", 0.0, 0.0, 0),
            record("T1", 1.0, 0.0, 1_000),
            record("T1", 1.0, 0.0, 2_000),
            record("T1", 1.0, 0.0, 8_000),
        ];

        let stats = aggregate_movement(&records);

        let t1 = &stats["T1"];
        assert_eq!(t1.total_distance_meters, 1.0);
        assert_eq!(t1.moving_time_minutes, 0.02);
        assert_eq!(t1.device_name.as_deref(), Some("T1-name"));
    }

    #[test]
    fn test_aggregate_omits_single_record_tags() {
        let records = vec![record("T1", 0.0, 0.0, 0)];

        let stats = aggregate_movement(&records);

        assert!(stats.is_empty());
    }

    #[test]
    fn test_aggregate_skips_non_positive_intervals() {
        let records = vec![
            record("T1", 0.0, 0.0, 1_000),
            record("T1", 5.0, 0.0, 1_000),
            record("T1", 9.0, 0.0, 500),
        ];

        let stats = aggregate_movement(&records);

        let t1 = &stats["T1"];
        assert_eq!(t1.total_distance_meters, 0.0);
        assert_eq!(t1.moving_time_minutes, 0.0);
    }

    #[test]
    fn test_aggregate_skips_gap_pairs() {
        // 10 m apart but 6 s apart, beyond the gap threshold.
        let records = vec![
            record("T1", 0.0, 0.0, 0),
            record("T1", 10.0, 0.0, 6_000),
        ];

        let stats = aggregate_movement(&records);

        let t1 = &stats["T1"];
        assert_eq!(t1.total_distance_meters, 0.0);
        assert_eq!(t1.moving_time_minutes, 0.0);
    }

    #[test]
    fn test_aggregate_filters_positioning_jitter() {
        // One centimeter per second is jitter, not movement.
        let records = vec![
            record("T1", 0.0, 0.0, 0),
            record("T1", 0.01, 0.0, 1_000),
        ];

        let stats = aggregate_movement(&records);

        let t1 = &stats["T1"];
        assert_eq!(t1.total_distance_meters, 0.0);
        assert_eq!(t1.moving_time_minutes, 0.0);
    }

    #[test]
    fn test_aggregate_ignores_vertical_movement() {
        let records = vec![
            TagHistoryRecord {
                uid: "T1".to_string(),
                device_name: None,
                position: Position::new(0.0, 0.0, 0.0),
                timestamp_ms: 0,
            },
            TagHistoryRecord {
                uid: "T1".to_string(),
                device_name: None,
                position: Position::new(0.0, 0.0, 10.0),
                timestamp_ms: 1_000,
            },
        ];

        let stats = aggregate_movement(&records);

        assert_eq!(stats["T1"].total_distance_meters, 0.0);
    }

    #[test]
    fn test_aggregate_groups_interleaved_uids() {
        let records = vec![
            record("T1", 0.0, 0.0, 0),
            record("T2", 0.0, 0.0, 500),
            record("T1", 2.0, 0.0, 1_000),
            record("T2", 0.0, 3.0, 1_500),
        ];

        let stats = aggregate_movement(&records);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats["T1"].total_distance_meters, 2.0);
        assert_eq!(stats["T2"].total_distance_meters, 3.0);
    }

    #[test]
    fn test_aggregate_empty_window() {
        let stats = aggregate_movement(&[]);

        assert!(stats.is_empty());
    }

    #[test]
    fn test_aggregate_rounds_to_two_decimals() {
        // Diagonal hop of sqrt(2) meters in one second.
        let records = vec![
            record("T1", 0.0, 0.0, 0),
            record("T1", 1.0, 1.0, 1_000),
        ];

        let stats = aggregate_movement(&records);

        assert_eq!(stats["T1"].total_distance_meters, 1.41);
    }
}
