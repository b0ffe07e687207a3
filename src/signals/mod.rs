// =============================================================================
// Signals Module
// =============================================================================
//
// Comparators that turn annotated candles into trading signals:
// - Crossover / crossunder of two operands between consecutive candles
// - Linear normalisation of indicator values

pub mod crossover;
pub mod normalize;

pub use crossover::{cross, crossover, crossunder, Operand};
pub use normalize::{normalize, normalize_unit};
