//! Gap Detection

use crate::anomaly::Anomaly;
use std::collections::HashSet;
use timeline::{SensorId, TimeKey, TimelineGrid};

/// One `Gap` anomaly for every grid slot the sensor never reported
///
/// Walks the grid itself rather than a set difference, so output follows grid order.
pub fn detect_gaps(
    grid: &TimelineGrid,
    seen: &HashSet<TimeKey>,
    sensor: &SensorId,
) -> Vec<Anomaly> {
    grid.iter()
        .filter(|key| !seen.contains(*key))
        .map(|key| Anomaly::gap(key.as_str(), sensor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyKind;

    #[test]
    fn test_gap_count() {
        let grid = TimelineGrid::generate(60).unwrap();
        let sensor = SensorId::from("SENSOR03");
        let seen: HashSet<TimeKey> = ["00:00", "00:01", "12:00"]
            .into_iter()
            .map(TimeKey::from)
            .collect();

        let gaps = detect_gaps(&grid, &seen, &sensor);
        assert_eq!(gaps.len(), grid.len() - seen.len());
        assert!(gaps.iter().all(|g| g.kind == AnomalyKind::Gap && g.sensor == sensor));
        assert!(gaps.iter().all(|g| !seen.contains(g.time.as_str())));
        assert_eq!(gaps[0].time, "00:02");
    }

    #[test]
    fn test_no_gaps_when_all_seen() {
        let grid = TimelineGrid::generate(3600).unwrap();
        let seen: HashSet<TimeKey> = grid.iter().cloned().collect();
        assert!(detect_gaps(&grid, &seen, &SensorId::from("S")).is_empty());
    }

    #[test]
    fn test_all_gaps_when_nothing_seen() {
        let grid = TimelineGrid::generate(1800).unwrap();
        let gaps = detect_gaps(&grid, &HashSet::new(), &SensorId::from("S"));
        assert_eq!(gaps.len(), 48);
    }
}
