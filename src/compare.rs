use crate::config::ComparisonConfig;
use serde::Serialize;
use std::fmt;

/// Estimated grid positions won or lost by one strategy against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionChange {
    Gain(u32),
    Lose(u32),
    NoChange,
}

impl fmt::Display for PositionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionChange::Gain(n) => write!(f, "Gain ~{n} positions"),
            PositionChange::Lose(n) => write!(f, "Lose ~{n} positions"),
            PositionChange::NoChange => f.write_str("No position change"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StrategyComparator {
    config: ComparisonConfig,
}

impl StrategyComparator {
    pub fn new(config: ComparisonConfig) -> Self {
        Self { config }
    }

    /// How strategy A fares against B given their total race times in seconds.
    /// A faster A (negative difference) gains positions.
    pub fn compare(&self, total_time_a: f64, total_time_b: f64) -> PositionChange {
        let diff = total_time_a - total_time_b;
        let positions = (diff.abs() / self.config.seconds_per_position).floor() as u32;

        if diff < 0.0 {
            PositionChange::Gain(positions)
        } else if diff > 0.0 {
            PositionChange::Lose(positions)
        } else {
            PositionChange::NoChange
        }
    }
}

/// Compares with one position per 5 seconds.
pub fn compare(total_time_a: f64, total_time_b: f64) -> PositionChange {
    StrategyComparator::default().compare(total_time_a, total_time_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slower_a_loses() {
        let change = compare(100.0, 80.0);
        assert_eq!(change, PositionChange::Lose(4));
        assert_eq!(change.to_string(), "Lose ~4 positions");
    }

    #[test]
    fn faster_a_gains() {
        let change = compare(80.0, 100.0);
        assert_eq!(change, PositionChange::Gain(4));
        assert_eq!(change.to_string(), "Gain ~4 positions");
    }

    #[test]
    fn equal_totals_no_change() {
        assert_eq!(compare(50.0, 50.0), PositionChange::NoChange);
        assert_eq!(compare(50.0, 50.0).to_string(), "No position change");
    }

    #[test]
    fn small_gaps_round_down_to_zero() {
        assert_eq!(compare(100.0, 96.0), PositionChange::Lose(0));
        assert_eq!(compare(96.0, 100.0), PositionChange::Gain(0));
        assert_eq!(compare(100.0, 89.9), PositionChange::Lose(2));
    }

    #[test]
    fn custom_seconds_per_position() {
        let comparator = StrategyComparator::new(ComparisonConfig { seconds_per_position: 2.0 });
        assert_eq!(comparator.compare(6340.0, 6350.5), PositionChange::Gain(5));
    }
}
