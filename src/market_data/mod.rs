pub mod candle;
pub mod store;

// Re-export for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, SeriesKey};
pub use store::{CandleQuery, CandleStore, MemoryCandleStore, StoredCandle};
