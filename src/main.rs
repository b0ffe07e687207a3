// =============================================================================
// candle-series — CLI Entry Point
// =============================================================================
//
// Loads the runtime config and a JSON candle table, builds one series from the
// configured defaults, runs the configured indicators and signal scans, and
// prints the annotated candles as JSON on stdout.  Logs go to stderr.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use candle_series::{MemoryCandleStore, RuntimeConfig, Series, SeriesParams};

fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("SERIES_CONFIG").unwrap_or_else(|_| "series_config.json".into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_overrides(|var| std::env::var(var).ok());

    // ── 2. Store & series ────────────────────────────────────────────────
    let store = Arc::new(
        MemoryCandleStore::load_json(&config.data_file).context("failed to open candle store")?,
    );

    let params = SeriesParams::from_config(&config);
    let key = params.key();
    let mut series = Series::new(params, store.clone()).with_band_mode(config.band_mode);

    let rows = series
        .size()
        .with_context(|| format!("failed to load series {key}"))?;
    info!(key = %key, rows, band_mode = %config.band_mode, "Series loaded");

    // ── 3. Indicators ────────────────────────────────────────────────────
    for spec in &config.indicators {
        match spec.apply(&mut series) {
            Ok(()) => info!(indicator = %spec, fields = ?spec.fields(), "Indicator computed"),
            Err(e) => error!(indicator = %spec, error = %e, "Indicator failed, skipping"),
        }
    }

    // ── 4. Signal scans ──────────────────────────────────────────────────
    for signal in &config.signals {
        match series.crossings(&signal.fish, &signal.sea, signal.direction) {
            Ok(times) => info!(
                fish = %signal.fish,
                sea = %signal.sea,
                direction = %signal.direction,
                count = times.len(),
                last = ?times.last(),
                "Signal scan"
            ),
            Err(e) => error!(
                fish = %signal.fish,
                sea = %signal.sea,
                error = %e,
                "Signal scan failed"
            ),
        }
    }

    // ── 5. Persist & print ───────────────────────────────────────────────
    if config.save_results {
        series.save().context("failed to save series")?;
        store
            .save_json(&config.data_file)
            .context("failed to write candle table")?;
    }

    let out = serde_json::to_string_pretty(series.all()?)
        .context("failed to serialise annotated candles")?;
    println!("{out}");

    Ok(())
}
