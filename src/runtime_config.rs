// =============================================================================
// Runtime Configuration — series defaults and the indicator plan
// =============================================================================
//
// Supplies the parameter defaults a series is built from (exchange, symbol,
// resolution, range, row cap) plus the list of indicators and signals the
// CLI runs.  Every field carries `#[serde(default)]` so that an older or
// partial config file still loads.
//
// Persistence uses an atomic tmp + rename pattern.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::{BandWidthMode, IndicatorSpec};
use crate::series::DEFAULT_LIMIT;
use crate::signals::Operand;
use crate::types::{Direction, Price};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_exchange() -> String {
    "binance".to_string()
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_resolution() -> i64 {
    3600
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_data_file() -> PathBuf {
    PathBuf::from("candles.json")
}

fn default_indicators() -> Vec<IndicatorSpec> {
    vec![
        IndicatorSpec::Sma {
            len: 20,
            price: Price::Close,
        },
        IndicatorSpec::Rsi {
            len: 14,
            price: Price::Close,
        },
        IndicatorSpec::Bb {
            len: 20,
            stdev: 2.0,
            price: Price::Close,
        },
    ]
}

// =============================================================================
// SignalSpec
// =============================================================================

/// A crossing to scan for once the indicators are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub fish: Operand,
    pub sea: Operand,
    #[serde(default)]
    pub direction: Direction,
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Series defaults ------------------------------------------------------
    #[serde(default = "default_exchange")]
    pub exchange: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Candle resolution in seconds.
    #[serde(default = "default_resolution")]
    pub resolution: i64,

    /// Most recent rows to load; below 1 means unbounded.
    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub start: i64,

    /// 0 means "now".
    #[serde(default)]
    pub end: i64,

    // --- Storage --------------------------------------------------------------
    /// JSON candle table backing the in-memory store.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Write annotated candles back to `data_file` after computing.
    #[serde(default)]
    pub save_results: bool,

    // --- Indicator plan -------------------------------------------------------
    #[serde(default)]
    pub band_mode: BandWidthMode,

    #[serde(default = "default_indicators")]
    pub indicators: Vec<IndicatorSpec>,

    #[serde(default)]
    pub signals: Vec<SignalSpec>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            symbol: default_symbol(),
            resolution: default_resolution(),
            limit: default_limit(),
            start: 0,
            end: 0,
            data_file: default_data_file(),
            save_results: false,
            band_mode: BandWidthMode::default(),
            indicators: default_indicators(),
            signals: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            exchange = %config.exchange,
            symbol = %config.symbol,
            resolution = config.resolution,
            indicators = config.indicators.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Override series defaults from `SERIES_*` variables.  `lookup` is
    /// normally `std::env::var(..).ok()`; unparsable numbers are ignored
    /// with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SERIES_DATA_FILE") {
            self.data_file = PathBuf::from(path);
        }
        if let Some(exchange) = lookup("SERIES_EXCHANGE") {
            self.exchange = exchange.trim().to_string();
        }
        if let Some(symbol) = lookup("SERIES_SYMBOL") {
            self.symbol = symbol.trim().to_uppercase();
        }
        for (var, slot) in [
            ("SERIES_RESOLUTION", &mut self.resolution),
            ("SERIES_LIMIT", &mut self.limit),
        ] {
            if let Some(raw) = lookup(var) {
                match raw.trim().parse::<i64>() {
                    Ok(v) => *slot = v,
                    Err(e) => warn!(var, value = %raw, error = %e, "ignoring invalid override"),
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.exchange, "binance");
        assert_eq!(cfg.symbol, "BTCUSDT");
        assert_eq!(cfg.limit, 200);
        assert_eq!(cfg.start, 0);
        assert_eq!(cfg.end, 0);
        assert_eq!(cfg.band_mode, BandWidthMode::Observed);
        assert_eq!(cfg.indicators.len(), 3);
        assert!(!cfg.save_results);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.resolution, 3600);
        assert_eq!(cfg.limit, 200);
        assert_eq!(cfg.data_file, PathBuf::from("candles.json"));
        assert_eq!(cfg.indicators, default_indicators());
        assert!(cfg.signals.is_empty());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "symbol": "ETHUSDT",
            "band_mode": "scaled",
            "indicators": [{"kind": "rsi", "len": 4}],
            "signals": [{"fish": "rsi_4_close", "sea": 50, "direction": "under"}]
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.exchange, "binance");
        assert_eq!(cfg.band_mode, BandWidthMode::Scaled);
        assert_eq!(
            cfg.indicators,
            vec![IndicatorSpec::Rsi {
                len: 4,
                price: Price::Close
            }]
        );
        assert_eq!(cfg.signals[0].sea, Operand::Value(50.0));
        assert_eq!(cfg.signals[0].direction, Direction::Under);
    }

    #[test]
    fn save_then_load_through_file() {
        let path = std::env::temp_dir().join(format!(
            "candle_series_config_{}.json",
            std::process::id()
        ));
        let mut cfg = RuntimeConfig::default();
        cfg.symbol = "SOLUSDT".into();
        cfg.limit = 0;
        cfg.save(&path).unwrap();
        let loaded = RuntimeConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.symbol, "SOLUSDT");
        assert_eq!(loaded.limit, 0);
        assert_eq!(loaded.indicators, cfg.indicators);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(RuntimeConfig::load("/nonexistent/series_config.json").is_err());
    }

    #[test]
    fn overrides_apply_and_skip_garbage() {
        let vars: HashMap<&str, &str> = [
            ("SERIES_SYMBOL", " ethusdt "),
            ("SERIES_LIMIT", "0"),
            ("SERIES_RESOLUTION", "five minutes"),
        ]
        .into_iter()
        .collect();
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.symbol, "ETHUSDT");
        assert_eq!(cfg.limit, 0);
        assert_eq!(cfg.resolution, 3600);
        assert_eq!(cfg.exchange, "binance");
    }
}
