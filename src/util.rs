//! Shared numerical conventions (spec §4.7).

/// Relative floating-point tolerance for test/invariant comparisons.
pub const REL_TOL: f64 = 1e-6;
/// Absolute floating-point tolerance for test/invariant comparisons.
pub const ABS_TOL: f64 = 1e-9;

/// Round to the nearest integer using banker's rounding (round-half-to-even),
/// used for chord half-counts so systematic bias doesn't accumulate when a
/// chord length is an exact odd multiple of the sampling interval.
pub fn round_half_even(x: f64) -> i64 {
    let floor = x.floor();
    let diff = x - floor;
    let floor_i = floor as i64;
    if (diff - 0.5).abs() < 1e-9 {
        if floor_i % 2 == 0 {
            floor_i
        } else {
            floor_i + 1
        }
    } else {
        x.round() as i64
    }
}

/// `true` if `a` and `b` are equal within the spec's tolerance convention:
/// relative `1e-6` or absolute `1e-9`.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let abs_diff = (a - b).abs();
    if abs_diff <= ABS_TOL {
        return true;
    }
    abs_diff <= REL_TOL * a.abs().max(b.abs())
}
