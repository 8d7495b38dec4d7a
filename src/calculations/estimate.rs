/// Policy that collapses a three-point estimate into one expected duration
/// in whole working days. Injectable on `Schedule` so the weighting can be
/// swapped and verified independently of the pass structure.
pub type DurationPolicy = fn(low: f64, likely: f64, high: f64) -> i64;

/// PERT-weighted expected duration: `(low + 4 * likely + high) / 6`,
/// rounded to the nearest whole working day, never negative.
pub fn pert_estimate(low: f64, likely: f64, high: f64) -> i64 {
    let expected = (low + 4.0 * likely + high) / 6.0;
    (expected.round() as i64).max(0)
}
