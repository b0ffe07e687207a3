// =============================================================================
// Linear normalisation
// =============================================================================
//
//   out = (out_max - out_min) / (in_max - in_min) * (value - in_max) + out_max
//
// A degenerate input range (in_max == in_min) returns `out_max - out_min`
// instead of dividing by zero.

/// Rescale `value` from `[in_min, in_max]` to `[out_min, out_max]`.
pub fn normalize(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let in_range = in_max - in_min;
    if in_range == 0.0 {
        return out_max - out_min;
    }
    (out_max - out_min) / in_range * (value - in_max) + out_max
}

/// Rescale `value` from `[in_min, in_max]` to `[-1, 1]`.
pub fn normalize_unit(value: f64, in_min: f64, in_max: f64) -> f64 {
    normalize(value, in_min, in_max, -1.0, 1.0)
}
