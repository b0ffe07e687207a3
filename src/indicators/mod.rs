// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Every indicator is a method on `Series` that scans it through the shared
// cursor and writes its value onto each candle under a canonical key.  Keys
// double as memo entries: asking twice for the same key is a no-op.  A key is
// only marked once its scan has completed, so a failed call leaves neither
// annotations nor a memo entry behind.

pub mod bollinger;
pub mod dev_sq;
pub mod midpoint;
pub mod rsi;
pub mod sma;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeriesError};
use crate::series::Series;
use crate::types::Price;

pub use bollinger::BandWidthMode;
pub use midpoint::ohlc4;

// =============================================================================
// Canonical keys
// =============================================================================

pub fn sma_key(len: usize, price: Price) -> String {
    format!("sma_{len}_{price}")
}

pub fn rsi_key(len: usize, price: Price) -> String {
    format!("rsi_{len}_{price}")
}

pub fn dev_sq_key(len: usize, price: Price) -> String {
    format!("dev_sq_{len}_{price}")
}

/// `stdev` is rendered in shortest form: `2.0` becomes `2`, `2.5` stays.
pub fn bb_high_key(len: usize, stdev: f64, price: Price) -> String {
    format!("bb_high_{len}_{stdev}_{price}")
}

pub fn bb_low_key(len: usize, stdev: f64, price: Price) -> String {
    format!("bb_low_{len}_{stdev}_{price}")
}

pub(crate) fn require_len(indicator: &str, len: usize) -> Result<()> {
    if len <= 1 {
        return Err(SeriesError::InvalidParameter(format!(
            "{indicator} needs int len > 1, got {len}"
        )));
    }
    Ok(())
}

// =============================================================================
// IndicatorSpec — config-driven dispatch
// =============================================================================

fn default_stdev() -> f64 {
    2.0
}

/// One indicator request, as written in the runtime config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Sma {
        len: usize,
        #[serde(default)]
        price: Price,
    },
    Rsi {
        len: usize,
        #[serde(default)]
        price: Price,
    },
    DevSq {
        len: usize,
        #[serde(default)]
        price: Price,
    },
    Bb {
        len: usize,
        #[serde(default = "default_stdev")]
        stdev: f64,
        #[serde(default)]
        price: Price,
    },
}

impl IndicatorSpec {
    /// Compute this indicator (and its dependencies) on `series`.
    pub fn apply(&self, series: &mut Series) -> Result<()> {
        match *self {
            Self::Sma { len, price } => series.sma(len, price)?,
            Self::Rsi { len, price } => series.rsi(len, price)?,
            Self::DevSq { len, price } => series.dev_sq(len, price)?,
            Self::Bb { len, stdev, price } => series.bb(len, stdev, price)?,
        };
        Ok(())
    }

    /// Candle fields written by this indicator, excluding dependencies.
    pub fn fields(&self) -> Vec<String> {
        match *self {
            Self::Sma { len, price } => vec![sma_key(len, price)],
            Self::Rsi { len, price } => vec![rsi_key(len, price)],
            Self::DevSq { len, price } => vec![dev_sq_key(len, price)],
            Self::Bb { len, stdev, price } => {
                vec![bb_high_key(len, stdev, price), bb_low_key(len, stdev, price)]
            }
        }
    }
}

impl std::fmt::Display for IndicatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sma { len, price } => write!(f, "sma({len}, {price})"),
            Self::Rsi { len, price } => write!(f, "rsi({len}, {price})"),
            Self::DevSq { len, price } => write!(f, "dev_sq({len}, {price})"),
            Self::Bb { len, stdev, price } => write!(f, "bb({len}, {stdev}, {price})"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn key_formats() {
        assert_eq!(sma_key(20, Price::Close), "sma_20_close");
        assert_eq!(rsi_key(14, Price::High), "rsi_14_high");
        assert_eq!(dev_sq_key(20, Price::Open), "dev_sq_20_open");
        assert_eq!(bb_high_key(20, 2.0, Price::Close), "bb_high_20_2_close");
        assert_eq!(bb_low_key(58, 2.5, Price::Low), "bb_low_58_2.5_low");
    }

    #[test]
    fn spec_deserialises_with_defaults() {
        let specs: Vec<IndicatorSpec> = serde_json::from_str(
            r#"[{"kind": "sma", "len": 20},
                {"kind": "rsi", "len": 14, "price": "open"},
                {"kind": "bb", "len": 20}]"#,
        )
        .unwrap();
        assert_eq!(
            specs,
            vec![
                IndicatorSpec::Sma { len: 20, price: Price::Close },
                IndicatorSpec::Rsi { len: 14, price: Price::Open },
                IndicatorSpec::Bb { len: 20, stdev: 2.0, price: Price::Close },
            ]
        );
        assert_eq!(specs[2].to_string(), "bb(20, 2, close)");
    }

    #[test]
    fn spec_apply_writes_listed_fields() {
        let mut s = series_of(&[3.0, 5.0, 4.0, 6.0, 7.0]);
        let spec = IndicatorSpec::Bb { len: 2, stdev: 2.0, price: Price::Close };
        spec.apply(&mut s).unwrap();
        for key in spec.fields() {
            assert!(s.all().unwrap().iter().all(|c| c.has_indicator(&key)), "{key}");
        }
    }

    #[test]
    fn spec_apply_propagates_errors() {
        let mut s = series_of(&[1.0]);
        let spec = IndicatorSpec::Rsi { len: 3, price: Price::Close };
        assert!(matches!(
            spec.apply(&mut s),
            Err(SeriesError::InsufficientData { .. })
        ));
    }
}
