// =============================================================================
// candle-series — cursor-scanned technical indicators over candle series
// =============================================================================
//
// A `Series` loads candles lazily from a `CandleStore`, then indicator methods
// (`sma`, `rsi`, `dev_sq`, `bb`) scan it through one shared cursor and write
// their values back onto each candle.  Signal helpers compare annotated
// candles.
//
// ```ignore
// let store = Arc::new(MemoryCandleStore::load_json("candles.json")?);
// let mut series = Series::new(SeriesParams::new("binance", "BTCUSDT", 3600), store);
// series.bb(20, 2.0, Price::Close)?.rsi(14, Price::Close)?;
// let times = series.crossings(&"close".into(), &"bb_low_20_2_close".into(), Direction::Under)?;
// ```
// =============================================================================

pub mod error;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod series;
pub mod signals;
pub mod types;

pub use error::{Result, SeriesError};
pub use indicators::{ohlc4, BandWidthMode, IndicatorSpec};
pub use market_data::{Candle, CandleQuery, CandleStore, MemoryCandleStore, SeriesKey};
pub use runtime_config::RuntimeConfig;
pub use series::{Series, SeriesParams};
pub use signals::{crossover, crossunder, normalize, Operand};
pub use types::{Direction, Price};
