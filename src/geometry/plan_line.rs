//! Plan-line generation and refinement (spec §4.4).

use crate::error::{Result, TrackGeomError};
use crate::sample::{statistics, ResampledSeries};

use super::zero_crossing::ZeroCrossing;

/// A plan line is a series aligned pointwise with a ResampledSeries: same
/// distances, different (target) values.
pub type PlanLine = ResampledSeries;

/// How to construct a plan line from a restored waveform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PlanLineMode {
    /// Flat zero: the restored waveform crosses the plan exactly at its own
    /// zero crossings, by construction.
    ZeroPoint,
    /// Wide Gaussian low-pass of the restored waveform.
    RestoredBased { sigma_m: f64 },
    /// Piecewise-linear lower envelope anchored at zero crossings.
    ConvexUpward { upward_cap_mm: Option<f64>, gradient_mm_per_m: Option<f64> },
}

/// Generate a plan line from `restored` under `mode` (spec §4.4, §6
/// `plan_line` operation). `crossings` is required (and ignored) for
/// `ZeroPoint`/`RestoredBased`, used as hull anchors for `ConvexUpward`.
pub fn generate_plan_line(
    restored: &ResampledSeries,
    crossings: &[ZeroCrossing],
    mode: &PlanLineMode,
) -> Result<PlanLine> {
    match *mode {
        PlanLineMode::ZeroPoint => Ok(generate_zero_point(restored)),
        PlanLineMode::RestoredBased { sigma_m } => gaussian_smooth(restored, sigma_m),
        PlanLineMode::ConvexUpward { upward_cap_mm, gradient_mm_per_m } => {
            generate_convex_upward(restored, crossings, upward_cap_mm, gradient_mm_per_m)
        }
    }
}

/// Zero everywhere: the step-free target where the restored waveform
/// crosses the plan only at its own detected zero crossings.
pub fn generate_zero_point(restored: &ResampledSeries) -> PlanLine {
    restored.with_values(vec![0.0; restored.len()])
}

/// Lower convex hull of the restored waveform (plus any zero-crossing
/// anchors), piecewise-linearly interpolated back onto every plan distance.
/// Guarantees `plan[i] <= restored[i]` everywhere (spec: "tamping can only
/// lift"), then applies an optional upward cap and gradient limiter.
pub fn generate_convex_upward(
    restored: &ResampledSeries,
    crossings: &[ZeroCrossing],
    upward_cap_mm: Option<f64>,
    gradient_mm_per_m: Option<f64>,
) -> Result<PlanLine> {
    let distances = restored.distances();
    let values = restored.values();

    let mut points: Vec<(f64, f64)> = distances.iter().zip(values.iter()).map(|(&d, &v)| (d, v)).collect();
    for c in crossings {
        points.push((c.distance, 0.0));
    }
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    points.dedup_by(|a, b| (a.0 - b.0).abs() < 1e-9);

    let hull = lower_convex_hull(&points);

    let mut plan = Vec::with_capacity(distances.len());
    let mut cursor = 0usize;
    for &d in &distances {
        plan.push(interpolate_chain(&hull, d, &mut cursor));
    }

    if let Some(cap) = upward_cap_mm {
        if cap < 0.0 {
            return Err(TrackGeomError::InvalidParams { reason: format!("upward_cap_mm must be >= 0, got {cap}") });
        }
        for (p, &v) in plan.iter_mut().zip(values.iter()) {
            *p = p.max(v - cap);
        }
    }

    if let Some(grad) = gradient_mm_per_m {
        if grad < 0.0 {
            return Err(TrackGeomError::InvalidParams { reason: format!("gradient_mm_per_m must be >= 0, got {grad}") });
        }
        limit_gradient(&mut plan, restored.tau(), grad);
    }

    Ok(restored.with_values(plan))
}

/// Standard Andrew's-monotone-chain lower hull. `points` must be sorted by
/// ascending x (distance); ties are not expected after `dedup_by`.
fn lower_convex_hull(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut hull: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for &p in points {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Linear interpolation along a piecewise-linear chain of `(x, y)` vertices,
/// clamped to endpoint values outside the chain's span.
fn interpolate_chain(chain: &[(f64, f64)], x: f64, cursor: &mut usize) -> f64 {
    let n = chain.len();
    if n == 1 {
        return chain[0].1;
    }
    if x <= chain[0].0 {
        return chain[0].1;
    }
    if x >= chain[n - 1].0 {
        return chain[n - 1].1;
    }
    while *cursor + 1 < n && chain[*cursor + 1].0 < x {
        *cursor += 1;
    }
    let (x0, y0) = chain[*cursor];
    let (x1, y1) = chain[(*cursor + 1).min(n - 1)];
    let span = x1 - x0;
    if span.abs() < 1e-12 {
        return y0;
    }
    let t = (x - x0) / span;
    y0 + t * (y1 - y0)
}

/// Bidirectional slope limiter: clamps `|plan[i] - plan[i-1]| <= grad * tau`
/// by walking forward then backward, pulling the steeper side in toward the
/// gentler one. A simplification of the machine's true gradient-transition
/// insertion (spec §4.5); good enough as a post-hoc limiter over an already
/// near-flat hull.
fn limit_gradient(plan: &mut [f64], tau: f64, grad_mm_per_m: f64) {
    let max_step = grad_mm_per_m * tau;
    for i in 1..plan.len() {
        let delta = plan[i] - plan[i - 1];
        if delta > max_step {
            plan[i] = plan[i - 1] + max_step;
        } else if delta < -max_step {
            plan[i] = plan[i - 1] - max_step;
        }
    }
    for i in (0..plan.len().saturating_sub(1)).rev() {
        let delta = plan[i] - plan[i + 1];
        if delta > max_step {
            plan[i] = plan[i + 1] + max_step;
        } else if delta < -max_step {
            plan[i] = plan[i + 1] - max_step;
        }
    }
}

/// Gaussian smoothing, kernel truncated to `+/-3*sigma_m`, renormalized near
/// boundaries so the output stays a weighted average (spec §4.4).
pub fn gaussian_smooth(series: &ResampledSeries, sigma_m: f64) -> Result<PlanLine> {
    if sigma_m <= 0.0 {
        return Err(TrackGeomError::InvalidParams { reason: format!("sigma_m must be > 0, got {sigma_m}") });
    }
    let tau = series.tau();
    let sigma_samples = sigma_m / tau;
    let radius = (3.0 * sigma_samples).ceil() as i64;

    let weights: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma_samples).powi(2)).exp())
        .collect();

    let values = series.values();
    let n = values.len() as i64;
    let mut out = vec![0.0; values.len()];
    for i in 0..n {
        let mut acc = 0.0;
        let mut weight_sum = 0.0;
        for (w_idx, &w) in weights.iter().enumerate() {
            let k = w_idx as i64 - radius;
            let j = i + k;
            if j >= 0 && j < n {
                acc += w * values[j as usize];
                weight_sum += w;
            }
        }
        out[i as usize] = if weight_sum > 0.0 { acc / weight_sum } else { values[i as usize] };
    }

    Ok(series.with_values(out))
}

/// Replace values more than `threshold * sigma` from the mean with the mean
/// (spec §4.4).
pub fn clamp_outliers(series: &ResampledSeries, threshold: f64) -> Result<PlanLine> {
    if threshold <= 0.0 {
        return Err(TrackGeomError::InvalidParams { reason: format!("threshold must be > 0, got {threshold}") });
    }
    let values = series.values();
    let st = statistics(&values);
    let limit = threshold * st.std_dev;
    let out: Vec<f64> = values
        .iter()
        .map(|&v| if (v - st.mean).abs() > limit { st.mean } else { v })
        .collect();
    Ok(series.with_values(out))
}

/// Repeatedly relax each interior point toward the average of its neighbors
/// until the largest per-iteration change drops below `convergence_mm` or
/// `max_iterations` (default 10) is reached (spec §4.4).
pub fn iterative_smooth(
    series: &ResampledSeries,
    k: f64,
    convergence_mm: f64,
    max_iterations: usize,
) -> Result<PlanLine> {
    if !(0.0..=1.0).contains(&k) {
        return Err(TrackGeomError::InvalidParams { reason: format!("k must be in [0,1], got {k}") });
    }
    let mut values = series.values();
    let n = values.len();
    for _ in 0..max_iterations.max(1) {
        let mut max_change = 0.0_f64;
        let mut next = values.clone();
        for i in 1..n.saturating_sub(1) {
            let relaxed = (1.0 - k) * values[i] + k * (values[i - 1] + values[i + 1]) / 2.0;
            max_change = max_change.max((relaxed - values[i]).abs());
            next[i] = relaxed;
        }
        values = next;
        if max_change < convergence_mm {
            break;
        }
    }
    Ok(series.with_values(values))
}

/// Centered moving average of `window_points` over `[start_d, end_d]` only;
/// samples outside the range are left unchanged (spec §4.4).
pub fn local_window_smooth(
    series: &ResampledSeries,
    start_d: f64,
    end_d: f64,
    window_points: usize,
) -> Result<PlanLine> {
    if window_points == 0 || window_points % 2 == 0 {
        return Err(TrackGeomError::InvalidParams {
            reason: format!("window_points must be a positive odd count, got {window_points}"),
        });
    }
    if end_d < start_d {
        return Err(TrackGeomError::InvalidParams { reason: format!("end_d {end_d} < start_d {start_d}") });
    }

    let distances = series.distances();
    let values = series.values();
    let n = values.len();
    let half = window_points / 2;

    let mut out = values.clone();
    for i in 0..n {
        if distances[i] < start_d || distances[i] > end_d {
            continue;
        }
        let lo = i.saturating_sub(half);
        let hi = (i + half).min(n - 1);
        let count = (hi - lo + 1) as f64;
        out[i] = values[lo..=hi].iter().sum::<f64>() / count;
    }
    Ok(series.with_values(out))
}

/// Natural cubic spline through `control_points` (sorted by distance,
/// distinct), evaluated at every distance of `series` (spec §4.4).
pub fn cubic_spline_fit(series: &ResampledSeries, control_points: &[(f64, f64)]) -> Result<PlanLine> {
    if control_points.len() < 2 {
        return Err(TrackGeomError::InvalidParams {
            reason: format!("cubic spline needs at least 2 control points, got {}", control_points.len()),
        });
    }
    let mut pts = control_points.to_vec();
    pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    for w in pts.windows(2) {
        if (w[1].0 - w[0].0).abs() < 1e-12 {
            return Err(TrackGeomError::InvalidParams { reason: "control point distances must be distinct".into() });
        }
    }

    let spline = NaturalCubicSpline::fit(&pts);
    let distances = series.distances();
    let out: Vec<f64> = distances.iter().map(|&d| spline.eval(d)).collect();
    Ok(series.with_values(out))
}

/// Natural cubic spline (zero second derivative at both ends), solved with
/// the standard tridiagonal (Thomas) sweep over the second-derivative
/// moments.
struct NaturalCubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    m: Vec<f64>,
}

impl NaturalCubicSpline {
    fn fit(points: &[(f64, f64)]) -> Self {
        let n = points.len();
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        if n == 2 {
            return NaturalCubicSpline { xs, ys, m: vec![0.0, 0.0] };
        }

        let mut h = vec![0.0; n - 1];
        for i in 0..n - 1 {
            h[i] = xs[i + 1] - xs[i];
        }

        // Tridiagonal system for interior moments m[1..n-1]; m[0]=m[n-1]=0.
        let mut a = vec![0.0; n]; // sub-diagonal
        let mut b = vec![0.0; n]; // diagonal
        let mut c = vec![0.0; n]; // super-diagonal
        let mut d = vec![0.0; n]; // rhs

        b[0] = 1.0;
        b[n - 1] = 1.0;
        for i in 1..n - 1 {
            a[i] = h[i - 1];
            b[i] = 2.0 * (h[i - 1] + h[i]);
            c[i] = h[i];
            d[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        }

        // Thomas algorithm.
        let mut cp = vec![0.0; n];
        let mut dp = vec![0.0; n];
        cp[0] = c[0] / b[0];
        dp[0] = d[0] / b[0];
        for i in 1..n {
            let denom = b[i] - a[i] * cp[i - 1];
            cp[i] = if i < n - 1 { c[i] / denom } else { 0.0 };
            dp[i] = (d[i] - a[i] * dp[i - 1]) / denom;
        }
        let mut m = vec![0.0; n];
        m[n - 1] = dp[n - 1];
        for i in (0..n - 1).rev() {
            m[i] = dp[i] - cp[i] * m[i + 1];
        }

        NaturalCubicSpline { xs, ys, m }
    }

    fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let i = match self.xs.binary_search_by(|v| v.partial_cmp(&x).unwrap()) {
            Ok(idx) => return self.ys[idx],
            Err(idx) => idx - 1,
        };
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a.powi(3) - a) * self.m[i] + (b.powi(3) - b) * self.m[i + 1]) * (h * h) / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{resample, Sample, Series};
    use std::f64::consts::PI;

    fn sine_series(n: usize, tau: f64, wavelength_m: f64, amplitude: f64) -> ResampledSeries {
        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                let d = i as f64 * tau;
                Sample::new(d, amplitude * (2.0 * PI * d / wavelength_m).sin())
            })
            .collect();
        resample(&Series::new(samples).unwrap(), tau).unwrap()
    }

    #[test]
    fn zero_point_plan_is_all_zero() {
        let series = sine_series(100, 0.25, 10.0, 2.0);
        let plan = generate_zero_point(&series);
        assert!(plan.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn convex_upward_never_exceeds_restored() {
        let series = sine_series(400, 0.25, 20.0, 3.0);
        let plan = generate_convex_upward(&series, &[], None, None).unwrap();
        for (p, r) in plan.values().iter().zip(series.values()) {
            assert!(*p <= r + 1e-9, "plan {} exceeds restored {}", p, r);
        }
    }

    #[test]
    fn convex_upward_cap_bounds_movement() {
        let series = sine_series(400, 0.25, 20.0, 3.0);
        let cap = 2.0;
        let plan = generate_convex_upward(&series, &[], Some(cap), None).unwrap();
        for (p, r) in plan.values().iter().zip(series.values()) {
            assert!(r - p <= cap + 1e-9, "movement exceeds cap at value {} vs plan {}", r, p);
        }
    }

    #[test]
    fn gaussian_smooth_preserves_constant_series() {
        let samples: Vec<Sample> = (0..50).map(|i| Sample::new(i as f64 * 0.25, 7.0)).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        let smoothed = gaussian_smooth(&series, 2.0).unwrap();
        for v in smoothed.values() {
            assert!((v - 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn gaussian_smooth_rejects_non_positive_sigma() {
        let series = sine_series(20, 0.25, 10.0, 1.0);
        assert!(gaussian_smooth(&series, 0.0).is_err());
    }

    #[test]
    fn clamp_outliers_replaces_extreme_values_with_mean() {
        let mut samples: Vec<Sample> = (0..50).map(|i| Sample::new(i as f64 * 0.25, 0.0)).collect();
        samples[25].value = 1000.0;
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        let clamped = clamp_outliers(&series, 2.0).unwrap();
        assert!(clamped.value_at(25) < 1000.0);
    }

    #[test]
    fn iterative_smooth_converges_on_already_flat_series() {
        let samples: Vec<Sample> = (0..30).map(|i| Sample::new(i as f64 * 0.25, 3.0)).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        let smoothed = iterative_smooth(&series, 0.5, 1e-6, 10).unwrap();
        for v in smoothed.values() {
            assert!((v - 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn local_window_smooth_only_touches_requested_range() {
        let mut samples: Vec<Sample> = (0..100).map(|i| Sample::new(i as f64 * 0.25, 0.0)).collect();
        samples[50].value = 10.0;
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        let smoothed = local_window_smooth(&series, 20.0, 30.0, 5).unwrap();
        assert!(smoothed.value_at(50) < 10.0);
        assert_eq!(smoothed.value_at(0), 0.0);
        assert_eq!(smoothed.value_at(99), 0.0);
    }

    #[test]
    fn cubic_spline_fit_passes_through_control_points() {
        let series = sine_series(200, 0.25, 20.0, 1.0);
        let control = vec![(0.0, 0.0), (10.0, 5.0), (25.0, -3.0), (49.75, 1.0)];
        let fitted = cubic_spline_fit(&series, &control).unwrap();
        let distances = series.distances();
        for &(cd, cv) in &control {
            let idx = distances.iter().position(|&d| (d - cd).abs() < 1e-9).unwrap();
            assert!((fitted.value_at(idx) - cv).abs() < 1e-6, "at {cd}: {} vs {cv}", fitted.value_at(idx));
        }
    }

    #[test]
    fn cubic_spline_fit_rejects_too_few_points() {
        let series = sine_series(20, 0.25, 10.0, 1.0);
        assert!(cubic_spline_fit(&series, &[(0.0, 0.0)]).is_err());
    }
}
