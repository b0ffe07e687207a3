use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::candle::{Candle, SeriesKey};

// ---------------------------------------------------------------------------
// Store interface
// ---------------------------------------------------------------------------

/// One range query against a candle store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleQuery {
    pub key: SeriesKey,
    /// Inclusive lower time bound.
    pub from: i64,
    /// Inclusive upper time bound.
    pub to: i64,
    /// Keep only the most recent `limit` rows; `None` means unbounded.
    pub limit: Option<usize>,
}

/// Persistent candle storage consulted by [`crate::series::Series`].
///
/// Implementations are shared behind `Arc` so a single store can back many
/// independent series.
pub trait CandleStore: Send + Sync {
    /// Candles in `[from, to]` for the query key, ascending by time.
    fn fetch(&self, query: &CandleQuery) -> Result<Vec<Candle>>;

    /// Time of the oldest stored candle for `symbol` at `resolution` on any
    /// exchange, if any.
    fn earliest_time(&self, symbol: &str, resolution: i64) -> Result<Option<i64>>;

    /// Insert or replace candles by `time`.
    fn save(&self, key: &SeriesKey, candles: &[Candle]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryCandleStore -- thread-safe table per (exchange, symbol, resolution)
// ---------------------------------------------------------------------------

/// A row of the JSON table dump: the series key columns plus the candle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCandle {
    pub exchange: String,
    pub symbol: String,
    pub resolution: i64,
    #[serde(flatten)]
    pub candle: Candle,
}

/// In-memory candle table, ordered and de-duplicated by `time` per key.
#[derive(Default)]
pub struct MemoryCandleStore {
    tables: RwLock<HashMap<SeriesKey, BTreeMap<i64, Candle>>>,
}

impl MemoryCandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a single candle (matched on `time`).
    pub fn insert(&self, key: SeriesKey, candle: Candle) {
        let mut map = self.tables.write();
        map.entry(key).or_default().insert(candle.time, candle);
    }

    /// Number of candles stored for a key.
    pub fn count(&self, key: &SeriesKey) -> usize {
        let map = self.tables.read();
        map.get(key).map_or(0, BTreeMap::len)
    }

    /// Build a store from a JSON array of [`StoredCandle`] rows.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read candle table from {}", path.display()))?;

        let rows: Vec<StoredCandle> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse candle table from {}", path.display()))?;

        let store = Self::new();
        let total = rows.len();
        for row in rows {
            let key = SeriesKey {
                exchange: row.exchange,
                symbol: row.symbol,
                resolution: row.resolution,
            };
            store.insert(key, row.candle);
        }

        info!(path = %path.display(), rows = total, "candle table loaded");
        Ok(store)
    }

    /// Dump every stored row to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let rows: Vec<StoredCandle> = {
            let map = self.tables.read();
            let mut keys: Vec<&SeriesKey> = map.keys().collect();
            keys.sort_by(|a, b| {
                (&a.exchange, &a.symbol, a.resolution).cmp(&(&b.exchange, &b.symbol, b.resolution))
            });
            keys.into_iter()
                .flat_map(|key| {
                    map[key].values().map(move |candle| StoredCandle {
                        exchange: key.exchange.clone(),
                        symbol: key.symbol.clone(),
                        resolution: key.resolution,
                        candle: candle.clone(),
                    })
                })
                .collect()
        };

        let content =
            serde_json::to_string_pretty(&rows).context("failed to serialise candle table")?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp table to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp table to {}", path.display()))?;

        info!(path = %path.display(), rows = rows.len(), "candle table saved (atomic)");
        Ok(())
    }
}

impl CandleStore for MemoryCandleStore {
    fn fetch(&self, query: &CandleQuery) -> Result<Vec<Candle>> {
        if query.from > query.to {
            return Ok(Vec::new());
        }
        let map = self.tables.read();
        let rows: Vec<&Candle> = match map.get(&query.key) {
            Some(table) => table.range(query.from..=query.to).map(|(_, c)| c).collect(),
            None => Vec::new(),
        };
        let start = match query.limit {
            Some(limit) => rows.len().saturating_sub(limit),
            None => 0,
        };
        debug!(
            key = %query.key,
            from = query.from,
            to = query.to,
            limit = ?query.limit,
            matched = rows.len(),
            "candle fetch"
        );
        Ok(rows[start..].iter().map(|c| (*c).clone()).collect())
    }

    fn earliest_time(&self, symbol: &str, resolution: i64) -> Result<Option<i64>> {
        let map = self.tables.read();
        Ok(map
            .iter()
            .filter(|(key, _)| key.symbol == symbol && key.resolution == resolution)
            .filter_map(|(_, table)| table.keys().next().copied())
            .min())
    }

    fn save(&self, key: &SeriesKey, candles: &[Candle]) -> Result<()> {
        let mut map = self.tables.write();
        let table = map.entry(key.clone()).or_default();
        for candle in candles {
            table.insert(candle.time, candle.clone());
        }
        debug!(key = %key, rows = candles.len(), "candles saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
