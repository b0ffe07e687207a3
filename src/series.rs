// =============================================================================
// Series — lazily loaded candle sequence with a single scan cursor
// =============================================================================
//
// Indicator scans follow one idiom: read a candle with `next`, look back with
// `prev`, mutate a copy, commit it with `set`.  The cursor is shared by every
// indicator on the series, so exactly one scan may be in flight at a time;
// fan-out work should use independent series.
//
// The computed-key memo is a same-instance cache only.  Replacing candles
// does not invalidate it; `clean()` or a fresh series does.
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SeriesError};
use crate::indicators::bollinger::BandWidthMode;
use crate::market_data::{Candle, CandleQuery, CandleStore, SeriesKey};
use crate::runtime_config::RuntimeConfig;

/// Row cap applied when the caller does not choose one.
pub const DEFAULT_LIMIT: i64 = 200;

// =============================================================================
// SeriesParams
// =============================================================================

/// Scalar parameters of one series request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesParams {
    pub exchange: String,
    pub symbol: String,
    pub resolution: i64,
    /// Inclusive start time; negative values are clamped to 0 on load.
    pub start: i64,
    /// Inclusive end time; 0 means "now" at load time.
    pub end: i64,
    /// Most recent rows to keep; values below 1 disable the cap.
    pub limit: i64,
}

impl SeriesParams {
    pub fn new(exchange: impl Into<String>, symbol: impl Into<String>, resolution: i64) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
            resolution,
            start: 0,
            end: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Params seeded from the configured exchange/symbol/resolution defaults.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            exchange: config.exchange.clone(),
            symbol: config.symbol.clone(),
            resolution: config.resolution,
            start: config.start,
            end: config.end,
            limit: config.limit,
        }
    }

    pub fn with_range(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey {
            exchange: self.exchange.clone(),
            symbol: self.symbol.clone(),
            resolution: self.resolution,
        }
    }
}

// =============================================================================
// Series
// =============================================================================

pub struct Series {
    params: SeriesParams,
    store: Option<Arc<dyn CandleStore>>,
    candles: Vec<Candle>,
    loaded: bool,
    pos: usize,
    computed: HashSet<String>,
    band_mode: BandWidthMode,
}

impl std::fmt::Debug for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Series")
            .field("key", &self.params.key().to_string())
            .field("candles", &self.candles.len())
            .field("loaded", &self.loaded)
            .field("pos", &self.pos)
            .field("computed", &self.computed)
            .field("band_mode", &self.band_mode)
            .finish()
    }
}

impl Series {
    /// A series that loads its candles from `store` on first use.
    pub fn new(params: SeriesParams, store: Arc<dyn CandleStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::detached(params)
        }
    }

    /// A series with no backing store; populate it with [`Series::add`].
    pub fn detached(params: SeriesParams) -> Self {
        Self {
            params,
            store: None,
            candles: Vec::new(),
            loaded: false,
            pos: 0,
            computed: HashSet::new(),
            band_mode: BandWidthMode::default(),
        }
    }

    /// Build a detached series straight from candles.
    pub fn from_candles(params: SeriesParams, candles: Vec<Candle>) -> Self {
        let mut series = Self::detached(params);
        series.candles = candles;
        series
    }

    /// Switching mode drops the memo for any bands already computed, so the
    /// next `bb` call rewrites them under the new width.
    pub fn with_band_mode(mut self, mode: BandWidthMode) -> Self {
        if mode != self.band_mode {
            self.computed.retain(|key| !key.starts_with("bb_"));
        }
        self.band_mode = mode;
        self
    }

    pub fn params(&self) -> &SeriesParams {
        &self.params
    }

    pub fn band_mode(&self) -> BandWidthMode {
        self.band_mode
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Current cursor position, in `[0, len]`.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether the indicator with this canonical key has been computed on
    /// this instance.
    pub fn is_computed(&self, key: &str) -> bool {
        self.computed.contains(key)
    }

    pub(crate) fn mark_computed(&mut self, key: impl Into<String>) {
        self.computed.insert(key.into());
    }

    // -------------------------------------------------------------------------
    // Lazy load
    // -------------------------------------------------------------------------

    /// Populate the series from its store.  Idempotent: only the first call
    /// queries, and a failed query is terminal for this series.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;

        let from = self.params.start.max(0);
        let to = if self.params.end != 0 {
            self.params.end
        } else {
            Utc::now().timestamp()
        };
        let limit = if self.params.limit < 1 {
            None
        } else {
            Some(self.params.limit as usize)
        };

        if !self.candles.is_empty() {
            debug!(rows = self.candles.len(), "series already populated, skipping load");
            return Ok(());
        }

        let key = self.params.key();
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| SeriesError::EmptyResult(format!("{key} (no store attached)")))?;

        let candles = store.fetch(&CandleQuery {
            key: key.clone(),
            from,
            to,
            limit,
        })?;

        if candles.is_empty() {
            return Err(SeriesError::EmptyResult(key.to_string()));
        }

        info!(key = %key, from, to, rows = candles.len(), "series loaded");
        self.candles = candles;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Cursor
    // -------------------------------------------------------------------------

    /// Candle at the cursor; when `advance`, step past it.
    ///
    /// Never loads: on a store-backed series call `load` (or `size`, `all`,
    /// any indicator) first, otherwise this returns `None`.
    pub fn next(&mut self, advance: bool) -> Option<&Candle> {
        let idx = self.pos;
        if idx >= self.candles.len() {
            return None;
        }
        if advance {
            self.pos += 1;
        }
        self.candles.get(idx)
    }

    /// Candle `stepback + 1` slots behind the cursor.  Right after `next`,
    /// `prev(0, _)` is the candle just read and `prev(1, _)` its predecessor.
    /// Like `next`, never loads.  Stepping back past the start yields `None`
    /// and, when `advance`, parks the cursor at 0.
    pub fn prev(&mut self, stepback: usize, advance: bool) -> Option<&Candle> {
        let back = stepback.checked_add(1);
        let idx = back.and_then(|b| self.pos.checked_sub(b));
        if advance {
            self.pos = idx.unwrap_or(0);
        }
        idx.and_then(|i| self.candles.get(i))
    }

    /// Replace the candle most recently returned by `next`.
    pub fn set(&mut self, candle: Candle) -> bool {
        match self
            .pos
            .checked_sub(1)
            .and_then(|i| self.candles.get_mut(i))
        {
            Some(slot) => {
                *slot = candle;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) -> &mut Self {
        self.pos = 0;
        self
    }

    // -------------------------------------------------------------------------
    // Whole-sequence access
    // -------------------------------------------------------------------------

    pub fn all(&mut self) -> Result<&[Candle]> {
        self.load()?;
        Ok(&self.candles)
    }

    pub fn size(&mut self) -> Result<usize> {
        self.load()?;
        Ok(self.candles.len())
    }

    /// Candle at an absolute index.
    pub fn get(&mut self, index: usize) -> Result<Option<&Candle>> {
        self.load()?;
        Ok(self.candles.get(index))
    }

    /// Append without triggering a load.
    pub fn add(&mut self, candle: Candle) {
        self.candles.push(candle);
    }

    /// Replace the whole sequence without triggering a load.
    pub fn set_candles(&mut self, candles: Vec<Candle>) {
        self.candles = candles;
    }

    /// Drop every candle, the loaded flag, the cursor and the memo.
    pub fn clean(&mut self) {
        self.candles.clear();
        self.loaded = false;
        self.computed.clear();
        self.reset();
    }

    pub fn into_candles(self) -> Vec<Candle> {
        self.candles
    }

    // -------------------------------------------------------------------------
    // Store round trips
    // -------------------------------------------------------------------------

    /// Persist every candle, indicator fields included, back to the store.
    pub fn save(&mut self) -> Result<()> {
        self.load()?;
        self.reset();
        let store = self.attached_store()?;
        let key = self.params.key();
        store.save(&key, &self.candles)?;
        info!(key = %key, rows = self.candles.len(), "series saved");
        Ok(())
    }

    /// Earliest stored time for this symbol and resolution on any exchange,
    /// optionally overriding either.
    pub fn start_only(&self, resolution: Option<i64>, symbol: Option<&str>) -> Result<Option<i64>> {
        let store = self.attached_store()?;
        let resolution = resolution.unwrap_or(self.params.resolution);
        let symbol = symbol.unwrap_or(&self.params.symbol);
        Ok(store.earliest_time(symbol, resolution)?)
    }

    fn attached_store(&self) -> Result<Arc<dyn CandleStore>> {
        self.store.clone().ok_or_else(|| {
            SeriesError::Store(anyhow::anyhow!(
                "no candle store attached to {}",
                self.params.key()
            ))
        })
    }
}
