// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band is `sma(len, price)`; the band width is the root mean of the
// trailing `len` deviation-squared values:
//   width = sqrt(sum(dev_sq window) / len)
//   high  = SMA + k * width
//   low   = SMA - k * width
//
// `k` comes from the series' `BandWidthMode`.  `Observed` keeps k = 1 no
// matter which `stdev` was requested; `stdev` still names the output fields.
// `Scaled` uses k = stdev.
// =============================================================================

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{bb_high_key, bb_low_key, dev_sq_key, require_len, sma_key};
use crate::error::{Result, SeriesError};
use crate::series::Series;
use crate::types::Price;

/// How the requested `stdev` multiplier enters the band formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandWidthMode {
    /// Bands one deviation wide regardless of `stdev`.
    Observed,
    /// Bands `stdev` deviations wide.
    Scaled,
}

impl Default for BandWidthMode {
    fn default() -> Self {
        Self::Observed
    }
}

impl BandWidthMode {
    pub fn multiplier(self, stdev: f64) -> f64 {
        match self {
            Self::Observed => 1.0,
            Self::Scaled => stdev,
        }
    }
}

impl std::fmt::Display for BandWidthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Observed => write!(f, "observed"),
            Self::Scaled => write!(f, "scaled"),
        }
    }
}

impl Series {
    /// Annotate every candle with `bb_high_<len>_<stdev>_<price>` and
    /// `bb_low_<len>_<stdev>_<price>`, computing `dev_sq(len, price)` (and
    /// through it the SMA) first if needed.
    pub fn bb(&mut self, len: usize, stdev: f64, price: Price) -> Result<&mut Self> {
        require_len("bb", len)?;
        if !(stdev.is_finite() && stdev >= 1.0) {
            return Err(SeriesError::InvalidParameter(format!(
                "bb needs float stdev >= 1, got {stdev}"
            )));
        }
        self.load()?;

        let high_key = bb_high_key(len, stdev, price);
        let low_key = bb_low_key(len, stdev, price);
        if self.is_computed(&high_key) && self.is_computed(&low_key) {
            trace!(indicator = %high_key, "already computed");
            return Ok(self);
        }

        self.dev_sq(len, price)?;
        let sma = sma_key(len, price);
        let dev_sq = dev_sq_key(len, price);
        let k = self.band_mode().multiplier(stdev);

        let mut window: VecDeque<f64> = VecDeque::with_capacity(len + 1);

        self.reset();
        while let Some(mut candle) = self.next(true).cloned() {
            window.push_back(candle.indicator(&dev_sq).unwrap_or(0.0));
            if window.len() > len {
                window.pop_front();
            }
            let width = (window.iter().sum::<f64>() / len as f64).sqrt();

            let p = candle.price(price);
            let mid = candle.indicator(&sma).unwrap_or(p);
            let (high, low) = (mid + k * width, mid - k * width);
            if high.is_finite() && low.is_finite() {
                candle.set_indicator(high_key.clone(), high);
                candle.set_indicator(low_key.clone(), low);
            }
            self.set(candle);
        }

        debug!(
            indicator = %high_key,
            mode = %self.band_mode(),
            "indicator computed"
        );
        self.mark_computed(high_key);
        self.mark_computed(low_key);
        Ok(self)
    }
}
