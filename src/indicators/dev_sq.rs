// =============================================================================
// Deviation Squared
// =============================================================================
//
//   dev_sq_t = (p_t - SMA_t)^2
//
// Candles without an SMA value (the partial-window start) fall back to their
// own price, so their deviation is 0.  An absent price leaves the field unset.

use tracing::{debug, trace};

use super::{dev_sq_key, require_len, sma_key};
use crate::error::Result;
use crate::series::Series;
use crate::types::Price;

impl Series {
    /// Annotate every candle with `dev_sq_<smalen>_<price>`, computing
    /// `sma(smalen, price)` first if needed.
    pub fn dev_sq(&mut self, smalen: usize, price: Price) -> Result<&mut Self> {
        require_len("dev_sq", smalen)?;
        self.load()?;

        let key = dev_sq_key(smalen, price);
        if self.is_computed(&key) {
            trace!(indicator = %key, "already computed");
            return Ok(self);
        }

        self.sma(smalen, price)?;
        let sma = sma_key(smalen, price);

        self.reset();
        while let Some(mut candle) = self.next(true).cloned() {
            let p = candle.price(price);
            let mean = candle.indicator(&sma).unwrap_or(p);
            let dev = (p - mean).powi(2);
            if dev.is_finite() {
                candle.set_indicator(key.clone(), dev);
            }
            self.set(candle);
        }

        debug!(indicator = %key, "indicator computed");
        self.mark_computed(key);
        Ok(self)
    }
}
