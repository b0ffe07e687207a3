// =============================================================================
// OHLC Midpoint
// =============================================================================
//
//   ohlc4 = (open + high + low + close) / 4
//
// Absent (NaN) components are an error, never averaged in.
// =============================================================================

use crate::error::{Result, SeriesError};
use crate::market_data::Candle;

/// Mean of the four price components.  Fails with `MissingField` when any of
/// them is absent.
pub fn ohlc4(candle: &Candle) -> Result<f64> {
    let parts = [
        ("open", candle.open),
        ("high", candle.high),
        ("low", candle.low),
        ("close", candle.close),
    ];
    if let Some(&(field, _)) = parts.iter().find(|(_, v)| v.is_nan()) {
        return Err(SeriesError::MissingField {
            time: candle.time,
            field,
        });
    }
    Ok(parts.iter().map(|(_, v)| v).sum::<f64>() / 4.0)
}
