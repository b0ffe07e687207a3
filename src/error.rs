// =============================================================================
// Series Errors
// =============================================================================
//
// Every failure is local and synchronous: nothing is retried, nothing is
// swallowed.  Callers decide whether to abort a whole indicator chain or
// substitute defaults.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, SeriesError>;

#[derive(Error, Debug)]
pub enum SeriesError {
    /// The load query returned zero rows.
    #[error("empty result for {0}")]
    EmptyResult(String),

    /// Fewer candles than the indicator window requires.
    #[error("series has {have} candles, {indicator} needs at least {need}")]
    InsufficientData {
        indicator: String,
        need: usize,
        have: usize,
    },

    /// Out-of-range length, unknown price field, sub-1 multiplier, ...
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A required OHLC component is absent on a candle.
    #[error("candle at {time} is missing {field}")]
    MissingField { time: i64, field: &'static str },

    /// A comparator operand names a field the candle does not carry.
    #[error("field {field} not found on candle at {time}")]
    FieldNotFound { time: i64, field: String },

    /// RSI average loss collapsed to zero while average gain did not.
    #[error("division by zero computing {indicator} at {time}")]
    DivisionByZero { indicator: String, time: i64 },

    /// Failure reported by the candle store.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
