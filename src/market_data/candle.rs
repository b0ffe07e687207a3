use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::Price;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle plus any indicator values computed on it.
///
/// Indicator values are keyed by their canonical name (`sma_20_close`,
/// `bb_high_20_2_close`, ...).  A missing key means "not computed yet",
/// never zero.  A price component the store did not supply is carried as
/// NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    #[serde(default = "absent", deserialize_with = "nullable_f64")]
    pub open: f64,
    #[serde(default = "absent", deserialize_with = "nullable_f64")]
    pub high: f64,
    #[serde(default = "absent", deserialize_with = "nullable_f64")]
    pub low: f64,
    #[serde(default = "absent", deserialize_with = "nullable_f64")]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(flatten)]
    indicators: BTreeMap<String, f64>,
}

fn absent() -> f64 {
    f64::NAN
}

/// Stores serialise NaN as `null`; read it back as NaN.
fn nullable_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
            indicators: BTreeMap::new(),
        }
    }

    /// Read the given price component.
    pub fn price(&self, price: Price) -> f64 {
        match price {
            Price::Open => self.open,
            Price::High => self.high,
            Price::Low => self.low,
            Price::Close => self.close,
        }
    }

    /// Resolve a field by name: core OHLCV fields first, then indicators.
    ///
    /// Returns `None` for unknown names and for absent (NaN) price components.
    pub fn get(&self, field: &str) -> Option<f64> {
        let core = match field {
            "open" => Some(self.open),
            "high" => Some(self.high),
            "low" => Some(self.low),
            "close" => Some(self.close),
            "volume" => Some(self.volume),
            _ => None,
        };
        match core {
            Some(v) if v.is_nan() => None,
            Some(v) => Some(v),
            None => self.indicator(field),
        }
    }

    pub fn indicator(&self, key: &str) -> Option<f64> {
        self.indicators.get(key).copied()
    }

    pub fn has_indicator(&self, key: &str) -> bool {
        self.indicators.contains_key(key)
    }

    pub fn set_indicator(&mut self, key: impl Into<String>, value: f64) {
        self.indicators.insert(key.into(), value);
    }

    pub fn indicators(&self) -> &BTreeMap<String, f64> {
        &self.indicators
    }
}

/// Composite key that identifies a stored candle series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub exchange: String,
    pub symbol: String,
    pub resolution: i64,
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.exchange, self.symbol, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_resolves_core_then_indicator_fields() {
        let mut c = Candle::new(60, 1.0, 2.0, 0.5, 1.5, 10.0);
        c.set_indicator("sma_2_close", 1.25);
        assert_eq!(c.get("close"), Some(1.5));
        assert_eq!(c.get("volume"), Some(10.0));
        assert_eq!(c.get("sma_2_close"), Some(1.25));
        assert_eq!(c.get("rsi_14_close"), None);
    }

    #[test]
    fn nan_price_reads_as_absent() {
        let c = Candle::new(60, f64::NAN, 2.0, 0.5, 1.5, 10.0);
        assert_eq!(c.get("open"), None);
        assert!(c.price(Price::Open).is_nan());
    }

    #[test]
    fn serialises_flat_with_indicator_fields() {
        let mut c = Candle::new(60, 1.0, 2.0, 0.5, 1.5, 10.0);
        c.set_indicator("sma_2_close", 1.25);
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["time"], 60);
        assert_eq!(v["sma_2_close"], 1.25);
    }

    #[test]
    fn missing_and_null_prices_deserialise_as_nan() {
        let c: Candle =
            serde_json::from_str(r#"{"time": 5, "open": null, "high": 2, "close": 1.5}"#).unwrap();
        assert!(c.open.is_nan());
        assert!(c.low.is_nan());
        assert_eq!(c.high, 2.0);
        assert_eq!(c.volume, 0.0);
        assert!(c.indicators().is_empty());
    }

    #[test]
    fn unknown_numeric_fields_become_indicators() {
        let c: Candle = serde_json::from_str(
            r#"{"time": 5, "open": 1, "high": 2, "low": 0.5, "close": 1.5, "volume": 3, "rsi_14_close": 55.5}"#,
        )
        .unwrap();
        assert_eq!(c.indicator("rsi_14_close"), Some(55.5));
    }

    #[test]
    fn key_display() {
        let key = SeriesKey {
            exchange: "binance".into(),
            symbol: "BTCUSDT".into(),
            resolution: 300,
        };
        assert_eq!(key.to_string(), "binance:BTCUSDT@300");
    }
}
