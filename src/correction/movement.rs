//! Raw movement and fixed-point anchoring (spec §4.5).

use super::caps::{apply_caps, MovementLimits};
use super::mtt::{apply_mtt_correction, MttAxis, MttConfig, MttIterationConfig};
use crate::error::{Diagnostics, Result, TrackGeomError};
use crate::sample::ResampledSeries;

/// `m_raw[i] = restored[i] - plan[i]`. Positive values mean the track must
/// be lifted/shifted toward the plan.
pub fn raw_movement(restored: &ResampledSeries, plan: &ResampledSeries) -> Result<ResampledSeries> {
    if restored.len() != plan.len() {
        return Err(TrackGeomError::InvalidParams {
            reason: format!("restored length {} != plan length {}", restored.len(), plan.len()),
        });
    }
    let out: Vec<f64> = restored.values().iter().zip(plan.values()).map(|(r, p)| r - p).collect();
    Ok(restored.with_values(out))
}

/// Linear interpolation of an arbitrary `(distances, values)` pair at `d`,
/// clamped to the endpoint values outside the series span.
fn interp(distances: &[f64], values: &[f64], d: f64) -> f64 {
    let n = distances.len();
    if d <= distances[0] {
        return values[0];
    }
    if d >= distances[n - 1] {
        return values[n - 1];
    }
    let idx = match distances.binary_search_by(|v| v.partial_cmp(&d).unwrap()) {
        Ok(i) => return values[i],
        Err(i) => i - 1,
    };
    let (d0, d1) = (distances[idx], distances[idx + 1]);
    let (v0, v1) = (values[idx], values[idx + 1]);
    let span = d1 - d0;
    if span.abs() < 1e-12 {
        return v0;
    }
    v0 + (d - d0) / span * (v1 - v0)
}

/// Adjust `plan` so the movement at each `d*` in `fixed_points_m` is exactly
/// 0, by adding a triangular offset ramp centered at `d*` that decays
/// linearly to 0 over `support_m` on each side (spec §4.5). Fixed points are
/// applied in order; a later point re-reads the movement left by earlier
/// adjustments.
pub fn apply_fixed_points(
    plan: &ResampledSeries,
    restored: &ResampledSeries,
    fixed_points_m: &[f64],
    support_m: f64,
) -> Result<ResampledSeries> {
    if support_m <= 0.0 {
        return Err(TrackGeomError::InvalidParams { reason: format!("support_m must be > 0, got {support_m}") });
    }
    if restored.len() != plan.len() {
        return Err(TrackGeomError::InvalidParams {
            reason: format!("restored length {} != plan length {}", restored.len(), plan.len()),
        });
    }

    let distances = plan.distances();
    let restored_values = restored.values();
    let mut plan_values = plan.values();

    for &d_star in fixed_points_m {
        if d_star < distances[0] || d_star > distances[distances.len() - 1] {
            return Err(TrackGeomError::OutOfRange {
                distance: d_star,
                min: distances[0],
                max: distances[distances.len() - 1],
            });
        }

        let restored_star = interp(&distances, &restored_values, d_star);
        let plan_star = interp(&distances, &plan_values, d_star);
        let m_star = restored_star - plan_star;
        if m_star == 0.0 {
            continue;
        }

        for (i, &d) in distances.iter().enumerate() {
            let taper = (1.0 - (d - d_star).abs() / support_m).max(0.0);
            plan_values[i] += m_star * taper;
        }
    }

    Ok(plan.with_values(plan_values))
}

/// Composed `movement(restored, plan, {fixed_points, limits, mtt})`
/// operation (spec §6 operation table): anchor the plan at any fixed
/// points, derive raw movement, clamp to caps and gradient-limit, then run
/// the optional MTT chord correction.
///
/// Clamping to caps can never by itself push a fixed point away from 0 (0
/// is always within any non-negative cap pair), but gradient limiting
/// smooths a capped point toward its neighbors and can pull a fixed-point
/// sample off zero if the caps elsewhere are tight enough to force a large
/// jump nearby and the configured gradient can't bridge it within the
/// series spacing. When that happens the anchoring invariant
/// (`|m(d*)| <= 1e-6`, spec §4.5) is violated for every possible plan line
/// under these caps and this gradient limit, not just this one, so the
/// operation fails with `InfeasibleConstraints` rather than silently
/// returning an unanchored result.
#[allow(clippy::too_many_arguments)]
pub fn movement(
    restored: &ResampledSeries,
    plan: &ResampledSeries,
    fixed_points_m: &[f64],
    support_m: f64,
    limits: &MovementLimits,
    mtt: Option<(&MttConfig, MttAxis, &MttIterationConfig)>,
) -> Result<(ResampledSeries, Diagnostics)> {
    let anchored_plan = if fixed_points_m.is_empty() {
        plan.clone()
    } else {
        apply_fixed_points(plan, restored, fixed_points_m, support_m)?
    };

    let raw = raw_movement(restored, &anchored_plan)?;
    let (capped, mut diagnostics) = apply_caps(&raw, limits)?;

    let distances = capped.distances();
    let values = capped.values();
    for &d_star in fixed_points_m {
        let realized = interp(&distances, &values, d_star);
        if realized.abs() > 1e-6 {
            return Err(TrackGeomError::InfeasibleConstraints {
                reason: format!(
                    "caps/gradient limits leave {realized:.6} mm of movement at fixed point {d_star} m, \
                     exceeding the 1e-6 mm anchoring tolerance for every plan line under these constraints"
                ),
            });
        }
    }

    let (corrected, mtt_diagnostics) = match mtt {
        Some((config, axis, iteration_config)) => apply_mtt_correction(&capped, config, axis, iteration_config),
        None => (capped, Diagnostics::new()),
    };
    diagnostics.warnings.extend(mtt_diagnostics.warnings);

    Ok((corrected, diagnostics))
}
