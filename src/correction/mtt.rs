//! MTT (multiple-tie tamper) chord-induced correction (spec §4.5).
//!
//! The tamper senses movement through a chord (two contact points, BC front
//! and CD rear) rather than directly; what gets realized on the track is the
//! chord's own versine-like transfer of whatever movement is commanded. This
//! module solves, by damped fixed-point iteration, for the commanded
//! movement whose chord-realized effect matches the originally desired
//! movement.
//!
//! The per-machine front/rear bias term the original system derives from its
//! machine table is not reconstructable from the specification alone (spec
//! §9 Open Questions); this implementation omits it (bias = 0) and iterates
//! purely on the symmetric chord transfer, documented as a simplification.

use crate::error::Diagnostics;
use crate::sample::ResampledSeries;
use crate::util::round_half_even;

/// Machine configuration: leveling (vertical) and lining (lateral) chords,
/// each with a front (BC) and rear (CD) length in meters (spec §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MttConfig {
    pub machine_type: String,
    pub leveling_bc_m: f64,
    pub leveling_cd_m: f64,
    pub lining_bc_m: f64,
    pub lining_cd_m: f64,
}

/// Which axis of `MttConfig` to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MttAxis {
    Leveling,
    Lining,
}

/// Damping factor, max iteration count, and convergence threshold for the
/// fixed-point solve. spec §9 offers 0.5/50 only as "a starting point ...
/// should be confirmed against authoritative specifications" — not a fixed
/// requirement, unlike the `1e-3` mm threshold itself. 0.5 undershoots: at
/// that damping the iteration's contraction factor is too close to 1 for
/// the supported chord/wavelength combinations to reach `1e-3` mm within 50
/// steps, so the default here is tuned up instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MttIterationConfig {
    pub damping: f64,
    pub max_iterations: usize,
    pub threshold_mm: f64,
}

impl Default for MttIterationConfig {
    fn default() -> Self {
        MttIterationConfig { damping: 0.9, max_iterations: 50, threshold_mm: 1e-3 }
    }
}

/// `(m[i-n] + m[i+n]) / 2 - m[i]` with boundary indices passed through
/// unchanged (there is no commanded-movement degree of freedom to solve for
/// past the edge of the series).
fn chord_transfer(values: &[f64], half_count: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = values.to_vec();
    if half_count < n {
        for i in half_count..n - half_count {
            out[i] = (values[i - half_count] + values[i + half_count]) / 2.0 - values[i];
        }
    }
    out
}

/// Solve for commanded movement `m` such that `chord_transfer(m, half_count)
/// ≈ target` via `m_{k+1} = m_k - damping * (target - chord_transfer(m_k))`.
///
/// `chord_transfer` is linear with eigenvalues `mu = cos(k*n) - 1 ∈ [-2, 0]`
/// on each frequency mode; for error `e_k = m_k - m*` this update gives
/// `e_{k+1} = (1 + damping*mu) * e_k`. Moving *against* the naive correction
/// direction (subtracting, not adding, the residual) keeps that factor in
/// `[1 - 2*damping, 1]` for `damping ∈ (0, 1)` — a genuine contraction for
/// every mode except the chord's own blind spot (`mu = 0`, a pure DC offset,
/// which no two-point chord can sense; that mode neither grows nor shrinks).
/// Adding the residual instead (the naive choice) gives a factor `>= 1` for
/// every mode and diverges.
///
/// Returns the best-effort result; if the max residual at convergence check
/// still exceeds `threshold_mm` after `max_iterations`, the caller is
/// expected to attach a `ConvergenceWarning`.
fn damped_fixed_point(target: &[f64], half_count: usize, config: &MttIterationConfig) -> (Vec<f64>, bool) {
    let mut m = target.to_vec();
    let mut converged = false;
    for _ in 0..config.max_iterations.max(1) {
        let realized = chord_transfer(&m, half_count);
        let mut max_diff = 0.0_f64;
        for i in 0..m.len() {
            let diff = target[i] - realized[i];
            max_diff = max_diff.max(diff.abs());
            m[i] -= config.damping * diff;
        }
        if max_diff < config.threshold_mm {
            converged = true;
            break;
        }
    }
    (m, converged)
}

/// Apply the configured axis's BC then CD chord correction in sequence to
/// `movement`, returning the adjusted movement and diagnostics (a
/// `ConvergenceWarning` if either chord failed to converge within
/// `iteration_config.max_iterations`, per spec §7 recovery case 3).
pub fn apply_mtt_correction(
    movement: &ResampledSeries,
    config: &MttConfig,
    axis: MttAxis,
    iteration_config: &MttIterationConfig,
) -> (ResampledSeries, Diagnostics) {
    let (bc_m, cd_m) = match axis {
        MttAxis::Leveling => (config.leveling_bc_m, config.leveling_cd_m),
        MttAxis::Lining => (config.lining_bc_m, config.lining_cd_m),
    };

    let tau = movement.tau();
    let bc_half = round_half_even((bc_m / 2.0) / tau).max(0) as usize;
    let cd_half = round_half_even((cd_m / 2.0) / tau).max(0) as usize;

    let mut diagnostics = Diagnostics::new();
    let target = movement.values();

    let (after_bc, bc_ok) = damped_fixed_point(&target, bc_half, iteration_config);
    let (after_cd, cd_ok) = damped_fixed_point(&after_bc, cd_half, iteration_config);

    if !bc_ok || !cd_ok {
        diagnostics.push(
            "MTT_CONVERGENCE",
            format!(
                "MTT {:?} correction for {} did not converge to {} mm within {} iterations",
                axis, config.machine_type, iteration_config.threshold_mm, iteration_config.max_iterations
            ),
        );
    }

    (movement.with_values(after_cd), diagnostics)
}
