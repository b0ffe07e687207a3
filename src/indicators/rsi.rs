// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Warm-up: walk the first `len` candles, summing candle-to-candle
//          gains and losses.  Each of them gets the placeholder value 50.
// Step 2 — The `len`-th candle gets the first real value from
//            avg_gain = sum_gain / len,  avg_loss = sum_loss / len
// Step 3 — Every later candle applies Wilder's smoothing:
//            avg_gain = (prev_avg_gain * (len - 1) + current_gain) / len
//            avg_loss = (prev_avg_loss * (len - 1) + current_loss) / len
// Step 4 — RS  = avg_gain / avg_loss   (RS == -1 is coerced to 0)
//          RSI = 100 - 100 / (1 + RS)
//
// Zero average loss:
//   - with a non-zero average gain the ratio is undefined; the call fails with
//     `DivisionByZero` and writes nothing.
//   - with a zero average gain there was no movement at all; RSI is 50.
// =============================================================================

use tracing::{debug, trace};

use super::{require_len, rsi_key};
use crate::error::{Result, SeriesError};
use crate::series::Series;
use crate::types::Price;

/// Value written on warm-up candles and on windows without any movement.
const NEUTRAL_RSI: f64 = 50.0;

impl Series {
    /// Annotate every candle with `rsi_<len>_<price>`.
    ///
    /// Fails with `InsufficientData` when the series is shorter than `len`
    /// and with `DivisionByZero` when the average loss collapses to zero while
    /// the average gain does not.  On failure no candle is touched.
    pub fn rsi(&mut self, len: usize, price: Price) -> Result<&mut Self> {
        require_len("rsi", len)?;
        self.load()?;

        let key = rsi_key(len, price);
        if self.is_computed(&key) {
            trace!(indicator = %key, "already computed");
            return Ok(self);
        }

        let have = self.size()?;
        if have < len {
            return Err(SeriesError::InsufficientData {
                indicator: key,
                need: len,
                have,
            });
        }

        let values = self.rsi_values(len, price, &key)?;

        self.reset();
        for value in values {
            let Some(mut candle) = self.next(true).cloned() else {
                break;
            };
            candle.set_indicator(key.clone(), value);
            self.set(candle);
        }

        debug!(indicator = %key, candles = have, "indicator computed");
        self.mark_computed(key);
        Ok(self)
    }

    /// Read-only pass producing one RSI value per candle.
    fn rsi_values(&mut self, len: usize, price: Price, key: &str) -> Result<Vec<f64>> {
        let len_f = len as f64;
        let mut values = Vec::new();

        // --- Warm-up ------------------------------------------------------------
        let mut sum_gain = 0.0;
        let mut sum_loss = 0.0;
        let mut prev_price: Option<f64> = None;
        let mut time = 0;

        self.reset();
        for _ in 0..len {
            let Some(candle) = self.next(true) else {
                break;
            };
            let p = candle.price(price);
            time = candle.time;
            if let Some(prev) = prev_price {
                let diff = p - prev;
                if diff > 0.0 {
                    sum_gain += diff;
                } else if diff < 0.0 {
                    sum_loss -= diff;
                }
            }
            values.push(NEUTRAL_RSI);
            prev_price = Some(p);
        }

        // --- First real value ---------------------------------------------------
        let mut avg_gain = sum_gain / len_f;
        let mut avg_loss = sum_loss / len_f;
        let first = rsi_from_averages(avg_gain, avg_loss).ok_or_else(|| {
            SeriesError::DivisionByZero {
                indicator: key.to_string(),
                time,
            }
        })?;
        if let Some(last) = values.last_mut() {
            *last = first;
        }

        // --- Wilder's smoothing -------------------------------------------------
        while let Some(candle) = self.next(true) {
            let p = candle.price(price);
            let time = candle.time;
            let diff = prev_price.map_or(0.0, |prev| p - prev);
            let gain = if diff > 0.0 { diff } else { 0.0 };
            let loss = if diff < 0.0 { -diff } else { 0.0 };

            avg_gain = (avg_gain * (len_f - 1.0) + gain) / len_f;
            avg_loss = (avg_loss * (len_f - 1.0) + loss) / len_f;

            let rsi = rsi_from_averages(avg_gain, avg_loss).ok_or_else(|| {
                SeriesError::DivisionByZero {
                    indicator: key.to_string(),
                    time,
                }
            })?;
            values.push(rsi);
            prev_price = Some(p);
        }

        Ok(values)
    }
}

/// RSI from smoothed averages; `None` when the gain/loss ratio is undefined.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { Some(NEUTRAL_RSI) } else { None };
    }
    let mut ratio = avg_gain / avg_loss;
    if ratio == -1.0 {
        ratio = 0.0;
    }
    Some(100.0 - 100.0 / (1.0 + ratio))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map_or(false, |a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn warmup_then_wilder_smoothing() {
        let mut s = series_of(&[10.0, 11.0, 10.0, 12.0, 11.0]);
        s.rsi(3, Price::Close).unwrap();
        let v = field(&mut s, "rsi_3_close");
        assert!(approx(v[0], 50.0));
        assert!(approx(v[1], 50.0));
        // first real value: gain 1/3 vs loss 1/3 => RS 1
        assert!(approx(v[2], 50.0));
        // +2: avg_gain 8/9, avg_loss 2/9 => RS 4
        assert!(approx(v[3], 80.0));
        // -1: avg_gain 16/27, avg_loss 13/27
        assert!(approx(v[4], 100.0 * 16.0 / 29.0));
    }

    #[test]
    fn exact_length_series_gets_one_real_value() {
        let mut s = series_of(&[5.0, 4.0, 6.0]);
        s.rsi(3, Price::Close).unwrap();
        let v = field(&mut s, "rsi_3_close");
        assert!(approx(v[0], 50.0));
        assert!(approx(v[1], 50.0));
        // gain 2, loss 1 => RS 2
        assert!(approx(v[2], 100.0 - 100.0 / 3.0));
    }

    #[test]
    fn rising_series_is_a_division_by_zero() {
        let len = 4;
        let closes: Vec<f64> = (0..len + 5).map(|x| 100.0 + 2.0 * x as f64).collect();
        let mut s = series_of(&closes);
        let err = s.rsi(len, Price::Close).unwrap_err();
        assert!(matches!(err, SeriesError::DivisionByZero { time: 4, .. }));
        assert!(field(&mut s, "rsi_4_close").iter().all(Option::is_none));
        assert!(!s.is_computed("rsi_4_close"));
    }

    #[test]
    fn falling_series_reaches_zero() {
        let closes: Vec<f64> = (1..=20).rev().map(|x| x as f64).collect();
        let mut s = series_of(&closes);
        s.rsi(5, Price::Close).unwrap();
        let v = field(&mut s, "rsi_5_close");
        for x in &v[4..] {
            assert!(approx(*x, 0.0), "expected 0, got {x:?}");
        }
    }

    #[test]
    fn flat_series_is_neutral() {
        let mut s = series_of(&[100.0; 12]);
        s.rsi(4, Price::Close).unwrap();
        assert!(field(&mut s, "rsi_4_close").iter().all(|v| approx(*v, 50.0)));
    }

    #[test]
    fn values_stay_in_range() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let mut s = series_of(&closes);
        s.rsi(14, Price::Close).unwrap();
        for v in field(&mut s, "rsi_14_close") {
            let v = v.unwrap();
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }

    #[test]
    fn insufficient_data() {
        let mut s = series_of(&[1.0, 2.0, 3.0]);
        let err = s.rsi(14, Price::Close).unwrap_err();
        assert!(matches!(
            err,
            SeriesError::InsufficientData { need: 14, have: 3, .. }
        ));
        assert!(!s.is_computed("rsi_14_close"));
    }

    #[test]
    fn rejects_short_len() {
        let mut s = series_of(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            s.rsi(1, Price::Close),
            Err(SeriesError::InvalidParameter(_))
        ));
    }

    #[test]
    fn ratio_helper() {
        assert_eq!(rsi_from_averages(0.0, 0.0), Some(50.0));
        assert_eq!(rsi_from_averages(1.0, 0.0), None);
        assert_eq!(rsi_from_averages(0.0, 1.0), Some(0.0));
        assert_eq!(rsi_from_averages(1.0, 1.0), Some(50.0));
    }
}
