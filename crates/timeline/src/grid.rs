//! Canonical Day Timeline

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Number of seconds covered by one grid
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Errors raised when building a grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Granularity of zero seconds
    #[error("granularity must be a positive number of seconds")]
    ZeroGranularity,

    /// Granularity that does not tile minutes or hours evenly
    #[error("granularity of {0}s does not align with minute or hour buckets")]
    Misaligned(u32),
}

/// Token identifying one slot of the day, e.g. `"13:05"` or `"13:05:40"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeKey(String);

impl TimeKey {
    /// Format the slot that starts `seconds` after midnight
    ///
    /// Minute-aligned granularities produce `HH:MM`, anything finer `HH:MM:SS`.
    pub fn from_seconds(seconds: u32, with_seconds: bool) -> Self {
        let h = seconds / 3600;
        let m = (seconds % 3600) / 60;
        let s = seconds % 60;
        if with_seconds {
            Self(format!("{:02}:{:02}:{:02}", h, m, s))
        } else {
            Self(format!("{:02}:{:02}", h, m))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TimeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TimeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TimeKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for TimeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, duplicate-free set of every slot in a day
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineGrid {
    /// Step between consecutive slots
    granularity_secs: u32,
    /// Slots in chronological order
    keys: Vec<TimeKey>,
    /// Slot -> position in `keys`
    index: HashMap<TimeKey, usize>,
}

impl TimelineGrid {
    /// Materialize the grid for the given step in seconds
    pub fn generate(granularity_secs: u32) -> Result<Self, GridError> {
        let keys: Vec<TimeKey> = Self::time_keys(granularity_secs)?.collect();
        let index = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();

        debug!(
            "Generated timeline grid: {}s step, {} slots",
            granularity_secs,
            keys.len()
        );

        Ok(Self {
            granularity_secs,
            keys,
            index,
        })
    }

    /// Lazily enumerate the slots for a granularity without materializing them
    ///
    /// Each call returns a fresh iterator starting again at midnight.
    pub fn time_keys(granularity_secs: u32) -> Result<impl Iterator<Item = TimeKey>, GridError> {
        Self::check_granularity(granularity_secs)?;
        let with_seconds = granularity_secs % 60 != 0;
        Ok((0..SECONDS_PER_DAY)
            .step_by(granularity_secs as usize)
            .map(move |s| TimeKey::from_seconds(s, with_seconds)))
    }

    /// Check that a step tiles minutes (sub-minute) or hours (minute multiples)
    pub fn check_granularity(granularity_secs: u32) -> Result<(), GridError> {
        match granularity_secs {
            0 => Err(GridError::ZeroGranularity),
            g if g < 60 && 60 % g == 0 => Ok(()),
            g if g % 60 == 0 && 3600 % g == 0 => Ok(()),
            g => Err(GridError::Misaligned(g)),
        }
    }

    pub fn granularity_secs(&self) -> u32 {
        self.granularity_secs
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// O(1) membership test on a raw token
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Position of a token in chronological order
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Canonical key for a raw token, if it belongs to the grid
    pub fn resolve(&self, key: &str) -> Option<&TimeKey> {
        self.position(key).map(|i| &self.keys[i])
    }

    pub fn keys(&self) -> &[TimeKey] {
        &self.keys
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeKey> {
        self.keys.iter()
    }
}

impl<'a> IntoIterator for &'a TimelineGrid {
    type Item = &'a TimeKey;
    type IntoIter = std::slice::Iter<'a, TimeKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VALID_STEPS: [u32; 18] = [
        1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60, 120, 300, 600, 900, 1800, 3600,
    ];

    #[test]
    fn test_minute_grid() {
        let grid = TimelineGrid::generate(60).unwrap();
        assert_eq!(grid.len(), 1440);
        assert_eq!(grid.keys()[0].as_str(), "00:00");
        assert_eq!(grid.keys()[1439].as_str(), "23:59");
        assert!(grid.contains("12:34"));
        assert!(!grid.contains("25:70"));
        assert!(!grid.contains("12:34:00"));
    }

    #[test]
    fn test_second_grid_bounds() {
        let grid = TimelineGrid::generate(5).unwrap();
        assert_eq!(grid.len(), 17_280);
        assert_eq!(grid.keys()[0].as_str(), "00:00:00");
        assert_eq!(grid.keys().last().unwrap().as_str(), "23:59:55");
        assert_eq!(grid.position("00:01:00"), Some(12));
    }

    #[test]
    fn test_hour_grid() {
        let grid = TimelineGrid::generate(3600).unwrap();
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.keys()[23].as_str(), "23:00");
    }

    #[test]
    fn test_rejects_misaligned_granularity() {
        assert_eq!(TimelineGrid::generate(0), Err(GridError::ZeroGranularity));
        assert_eq!(TimelineGrid::generate(7), Err(GridError::Misaligned(7)));
        assert_eq!(TimelineGrid::generate(90), Err(GridError::Misaligned(90)));
        assert_eq!(TimelineGrid::generate(7200), Err(GridError::Misaligned(7200)));
    }

    #[test]
    fn test_time_keys_restartable() {
        let first: Vec<_> = TimelineGrid::time_keys(600).unwrap().take(3).collect();
        let second: Vec<_> = TimelineGrid::time_keys(600).unwrap().take(3).collect();
        assert_eq!(first, second);
        assert_eq!(first[2].as_str(), "00:20");
    }

    #[test]
    fn test_resolve_returns_canonical_key() {
        let grid = TimelineGrid::generate(60).unwrap();
        assert_eq!(grid.resolve("08:15").map(TimeKey::as_str), Some("08:15"));
        assert!(grid.resolve(" 08:15").is_none());
    }

    proptest! {
        #[test]
        fn prop_grid_size_and_order(idx in 0usize..VALID_STEPS.len()) {
            let step = VALID_STEPS[idx];
            let grid = TimelineGrid::generate(step).unwrap();
            prop_assert_eq!(grid.len(), (SECONDS_PER_DAY / step) as usize);
            for pair in grid.keys().windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for (i, key) in grid.iter().enumerate() {
                prop_assert_eq!(grid.position(key.as_str()), Some(i));
            }
        }
    }
}
