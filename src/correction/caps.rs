//! Movement caps and gradient-limited transitions (spec §4.5).

use crate::error::{Diagnostics, Result, TrackGeomError};
use crate::sample::ResampledSeries;

/// Directional movement limits in millimeters. `max_up`/`max_down` apply
/// uniformly to whichever direction the carried movement series represents
/// (vertical lift for leveling, lateral shift for lining).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Caps {
    pub max_up: f64,
    pub max_down: f64,
}

/// A section-scoped cap override; later-declared overrides at the same
/// `priority` covering the same distance are a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SectionOverride {
    pub start: f64,
    pub end: f64,
    pub caps: Caps,
    pub priority: i32,
}

/// Global caps plus an ordered set of per-section overrides (spec §3, §4.5).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovementLimits {
    pub max_up: f64,
    pub max_down: f64,
    pub max_left: f64,
    pub max_right: f64,
    pub enable_gradient: bool,
    pub gradient_mm_per_m: f64,
    pub overrides: Vec<SectionOverride>,
}

impl MovementLimits {
    /// Global caps with gradient limiting disabled and no overrides.
    pub fn global(max_up: f64, max_down: f64) -> Self {
        MovementLimits {
            max_up,
            max_down,
            max_left: max_up,
            max_right: max_down,
            enable_gradient: false,
            gradient_mm_per_m: 0.0,
            overrides: Vec::new(),
        }
    }

    /// Reject overlapping overrides that share a priority but disagree on
    /// caps: there is no well-defined winner (spec §7 `IncompatibleConstraints`).
    pub fn validate(&self) -> Result<()> {
        for i in 0..self.overrides.len() {
            for j in (i + 1)..self.overrides.len() {
                let (a, b) = (self.overrides[i], self.overrides[j]);
                let overlaps = a.start < b.end && b.start < a.end;
                if overlaps && a.priority == b.priority && a.caps != b.caps {
                    return Err(TrackGeomError::IncompatibleConstraints {
                        reason: format!(
                            "overrides [{},{}] and [{},{}] share priority {} with differing caps",
                            a.start, a.end, b.start, b.end, a.priority
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Caps in effect at `distance`: the highest-priority override covering
    /// it, else the global caps.
    fn caps_at(&self, distance: f64) -> Caps {
        let mut best: Option<&SectionOverride> = None;
        for ov in &self.overrides {
            if distance >= ov.start && distance <= ov.end {
                match best {
                    Some(b) if b.priority >= ov.priority => {}
                    _ => best = Some(ov),
                }
            }
        }
        match best {
            Some(ov) => ov.caps,
            None => Caps { max_up: self.max_up, max_down: self.max_down },
        }
    }
}

/// Clamp `movement` to the caps in effect at each distance, then (if
/// `enable_gradient`) smooth any resulting discontinuity at section
/// boundaries to a slope no steeper than `gradient_mm_per_m` (spec §4.5).
/// Clamped points are reported in `Diagnostics`.
pub fn apply_caps(movement: &ResampledSeries, limits: &MovementLimits) -> Result<(ResampledSeries, Diagnostics)> {
    limits.validate()?;

    let distances = movement.distances();
    let mut values = movement.values();
    let mut diagnostics = Diagnostics::new();
    let mut clamped_count = 0usize;

    for (i, &d) in distances.iter().enumerate() {
        let caps = limits.caps_at(d);
        let v = values[i];
        let clamped = v.clamp(-caps.max_down, caps.max_up);
        if (clamped - v).abs() > 1e-12 {
            clamped_count += 1;
        }
        values[i] = clamped;
    }

    if clamped_count > 0 {
        diagnostics.push("MOVEMENT_CLAMPED", format!("{clamped_count} point(s) clamped to configured caps"));
    }

    if limits.enable_gradient {
        limit_gradient(&mut values, movement.tau(), limits.gradient_mm_per_m);
    }

    Ok((movement.with_values(values), diagnostics))
}

/// Bidirectional slope limiter identical in spirit to the one used for
/// convex-upward plan-line generation: pulls the steeper side of any
/// boundary discontinuity in toward the gentler one.
fn limit_gradient(values: &mut [f64], tau: f64, grad_mm_per_m: f64) {
    let max_step = grad_mm_per_m * tau;
    for i in 1..values.len() {
        let delta = values[i] - values[i - 1];
        if delta > max_step {
            values[i] = values[i - 1] + max_step;
        } else if delta < -max_step {
            values[i] = values[i - 1] - max_step;
        }
    }
    for i in (0..values.len().saturating_sub(1)).rev() {
        let delta = values[i] - values[i + 1];
        if delta > max_step {
            values[i] = values[i + 1] + max_step;
        } else if delta < -max_step {
            values[i] = values[i + 1] - max_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{resample, Sample, Series};

    fn series_with_peak(n: usize, tau: f64, peak_idx: usize, peak_value: f64) -> ResampledSeries {
        let mut samples: Vec<Sample> = (0..n).map(|i| Sample::new(i as f64 * tau, 0.0)).collect();
        samples[peak_idx].value = peak_value;
        resample(&Series::new(samples).unwrap(), tau).unwrap()
    }

    #[test]
    fn scenario_6_movement_clipped_to_symmetric_caps() {
        let movement = series_with_peak(400, 0.25, 200, 80.0);
        let limits = MovementLimits::global(50.0, 50.0);
        let (clipped, diagnostics) = apply_caps(&movement, &limits).unwrap();
        assert!((clipped.value_at(200) - 50.0).abs() < 1e-9);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn caps_hold_within_slack_everywhere() {
        let movement = series_with_peak(400, 0.25, 200, 80.0);
        let mut neg_peak = movement.values();
        neg_peak[300] = -90.0;
        let movement = movement.with_values(neg_peak);
        let limits = MovementLimits::global(50.0, 50.0);
        let (clipped, _) = apply_caps(&movement, &limits).unwrap();
        for v in clipped.values() {
            assert!(v <= 50.0 + 1e-6 && v >= -50.0 - 1e-6);
        }
    }

    #[test]
    fn section_override_takes_precedence_by_priority() {
        let movement = series_with_peak(400, 0.25, 200, 80.0);
        let mut limits = MovementLimits::global(50.0, 50.0);
        limits.overrides.push(SectionOverride {
            start: 40.0,
            end: 60.0,
            caps: Caps { max_up: 10.0, max_down: 10.0 },
            priority: 1,
        });
        let (clipped, _) = apply_caps(&movement, &limits).unwrap();
        assert!((clipped.value_at(200) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn conflicting_same_priority_overrides_are_rejected() {
        let movement = series_with_peak(40, 0.25, 20, 10.0);
        let mut limits = MovementLimits::global(50.0, 50.0);
        limits.overrides.push(SectionOverride { start: 0.0, end: 5.0, caps: Caps { max_up: 10.0, max_down: 10.0 }, priority: 1 });
        limits.overrides.push(SectionOverride { start: 2.0, end: 8.0, caps: Caps { max_up: 20.0, max_down: 20.0 }, priority: 1 });
        assert!(matches!(apply_caps(&movement, &limits), Err(TrackGeomError::IncompatibleConstraints { .. })));
    }
}
