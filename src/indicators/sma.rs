// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// For each candle the average of `price` over the `len` candles *before* it:
//   SMA_t = (p_{t-1} + p_{t-2} + ... + p_{t-len}) / len
//
// Missing predecessors at the start of the series contribute 0 while the
// divisor stays `len`, so the first outputs are partial rather than absent.
// A zero sum leaves the field unset.
// =============================================================================

use tracing::{debug, trace};

use super::{require_len, sma_key};
use crate::error::Result;
use crate::series::Series;
use crate::types::Price;

impl Series {
    /// Annotate every candle with `sma_<len>_<price>`.
    pub fn sma(&mut self, len: usize, price: Price) -> Result<&mut Self> {
        require_len("sma", len)?;
        self.load()?;

        let key = sma_key(len, price);
        if self.is_computed(&key) {
            trace!(indicator = %key, "already computed");
            return Ok(self);
        }

        let divisor = len as f64;
        let mut written = 0usize;

        self.reset();
        while let Some(mut candle) = self.next(true).cloned() {
            let mut total = 0.0;
            for i in 1..=len {
                if let Some(prev) = self.prev(i, false) {
                    total += prev.price(price);
                }
            }
            if total != 0.0 && total.is_finite() {
                candle.set_indicator(key.clone(), total / divisor);
                self.set(candle);
                written += 1;
            }
        }

        debug!(indicator = %key, written, "indicator computed");
        self.mark_computed(key);
        Ok(self)
    }
}
