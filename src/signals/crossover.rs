// =============================================================================
// Crossover / Crossunder
// =============================================================================
//
// Compares two operands ("fish" and "sea") on two consecutive candles:
//   over  — fish < sea on the previous candle and fish > sea on the current
//   under — fish > sea on the previous candle and fish < sea on the current
// Equality on either candle never counts as a cross.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SeriesError};
use crate::market_data::Candle;
use crate::series::Series;
use crate::types::Direction;

/// A comparator operand: a constant, or a field resolved on each candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Value(f64),
    Field(String),
}

impl Operand {
    fn resolve(&self, candle: &Candle) -> Result<f64> {
        match self {
            Self::Value(v) => Ok(*v),
            Self::Field(name) => candle.get(name).ok_or_else(|| SeriesError::FieldNotFound {
                time: candle.time,
                field: name.clone(),
            }),
        }
    }
}

impl From<f64> for Operand {
    fn from(v: f64) -> Self {
        Self::Value(v)
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Self::Value(f64::from(v))
    }
}

/// Numeric text becomes a constant, anything else a field name.
impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        match s.trim().parse::<f64>() {
            Ok(v) => Self::Value(v),
            Err(_) => Self::Field(s.to_string()),
        }
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// Strict crossing of `fish` against `sea` between `prev` and `candle`.
pub fn cross(
    prev: &Candle,
    candle: &Candle,
    fish: &Operand,
    sea: &Operand,
    direction: Direction,
) -> Result<bool> {
    let fish1 = fish.resolve(prev)?;
    let fish2 = fish.resolve(candle)?;
    let sea1 = sea.resolve(prev)?;
    let sea2 = sea.resolve(candle)?;

    Ok(match direction {
        Direction::Over => fish1 < sea1 && fish2 > sea2,
        Direction::Under => fish1 > sea1 && fish2 < sea2,
    })
}

/// `crossover(prev, cur, "rsi_4_close", 50)`
pub fn crossover(
    prev: &Candle,
    candle: &Candle,
    fish: impl Into<Operand>,
    sea: impl Into<Operand>,
) -> Result<bool> {
    cross(prev, candle, &fish.into(), &sea.into(), Direction::Over)
}

/// `crossunder(prev, cur, "close", "bb_low_58_2_close")`
pub fn crossunder(
    prev: &Candle,
    candle: &Candle,
    fish: impl Into<Operand>,
    sea: impl Into<Operand>,
) -> Result<bool> {
    cross(prev, candle, &fish.into(), &sea.into(), Direction::Under)
}

impl Series {
    /// Times of every candle at which `fish` crosses `sea` in `direction`,
    /// comparing each candle with its predecessor.
    pub fn crossings(
        &mut self,
        fish: &Operand,
        sea: &Operand,
        direction: Direction,
    ) -> Result<Vec<i64>> {
        self.load()?;

        let mut times = Vec::new();
        self.reset();
        while let Some(candle) = self.next(true).cloned() {
            let Some(prev) = self.prev(1, false) else {
                continue;
            };
            if cross(prev, &candle, fish, sea, direction)? {
                times.push(candle.time);
            }
        }

        debug!(%fish, %sea, %direction, found = times.len(), "crossings scanned");
        Ok(times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesParams;

    fn at(time: i64, close: f64) -> Candle {
        Candle::new(time, close, close, close, close, 1.0)
    }

    #[test]
    fn crossover_needs_strict_sides() {
        assert!(crossover(&at(1, 49.0), &at(2, 51.0), "close", 50).unwrap());
        assert!(!crossover(&at(1, 50.0), &at(2, 51.0), "close", 50).unwrap());
        assert!(!crossover(&at(1, 49.0), &at(2, 50.0), "close", 50).unwrap());
        assert!(!crossover(&at(1, 51.0), &at(2, 49.0), "close", 50).unwrap());
    }

    #[test]
    fn crossunder_mirrors() {
        assert!(crossunder(&at(1, 51.0), &at(2, 49.0), "close", 50.0).unwrap());
        assert!(!crossunder(&at(1, 49.0), &at(2, 51.0), "close", 50.0).unwrap());
        assert!(!crossunder(&at(1, 50.0), &at(2, 49.0), "close", 50.0).unwrap());
    }

    #[test]
    fn field_against_field() {
        let mut prev = at(1, 10.0);
        prev.set_indicator("bb_low_20_2_close", 11.0);
        let mut cur = at(2, 10.0);
        cur.set_indicator("bb_low_20_2_close", 9.0);
        assert!(crossover(&prev, &cur, "close", "bb_low_20_2_close").unwrap());
        assert!(crossunder(&prev, &cur, "bb_low_20_2_close", "close").unwrap());
    }

    #[test]
    fn missing_field_on_either_candle() {
        let mut prev = at(1, 10.0);
        prev.set_indicator("rsi_4_close", 40.0);
        let cur = at(2, 10.0);
        match crossover(&prev, &cur, "rsi_4_close", 50) {
            Err(SeriesError::FieldNotFound { time, field }) => {
                assert_eq!(time, 2);
                assert_eq!(field, "rsi_4_close");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            crossover(&cur, &prev, "rsi_4_close", 50),
            Err(SeriesError::FieldNotFound { time: 2, .. })
        ));
    }

    #[test]
    fn numeric_text_is_a_constant() {
        assert_eq!(Operand::from("50"), Operand::Value(50.0));
        assert_eq!(Operand::from("sma_2_close"), Operand::Field("sma_2_close".into()));
        let op: Operand = serde_json::from_str("\"rsi_4_close\"").unwrap();
        assert_eq!(op, Operand::Field("rsi_4_close".into()));
        let op: Operand = serde_json::from_str("70").unwrap();
        assert_eq!(op, Operand::Value(70.0));
    }

    #[test]
    fn series_crossings_scan() {
        let mut s = Series::detached(SeriesParams::new("x", "Y", 60));
        for (i, c) in [48.0, 52.0, 50.0, 47.0, 53.0, 53.0].iter().enumerate() {
            s.add(at(i as i64 + 1, *c));
        }
        let fish = Operand::from("close");
        let sea = Operand::from(50.0);
        assert_eq!(s.crossings(&fish, &sea, Direction::Over).unwrap(), vec![2, 5]);
        assert!(s.crossings(&fish, &sea, Direction::Under).unwrap().is_empty());
    }
}
