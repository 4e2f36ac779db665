//! Versine, eccentric versine, sinusoidal transfer characteristics, and
//! eccentric-versine conversion (spec §4.4).

use crate::error::{Result, TrackGeomError};
use crate::sample::ResampledSeries;
use crate::util::round_half_even;
use std::f64::consts::PI;

/// Chord presets accepted by `versine` (spec §6).
pub const CHORD_PRESETS_M: [f64; 4] = [5.0, 10.0, 20.0, 40.0];

/// Which sign/amplitude convention to compute the symmetric versine in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum VersineMode {
    /// `V[i] = (y[i-n] + y[i+n])/2 - y[i]`.
    Y1,
    /// `V2[i] = 2*y[i] - y[i-n] - y[i+n]` (sign-inverted, doubled amplitude).
    Y2,
}

fn half_chord_count(chord_m: f64, tau: f64) -> usize {
    round_half_even((chord_m / 2.0) / tau).max(0) as usize
}

/// Symmetric versine at chord length `chord_m` (one of the presets), in the
/// requested sign/scale convention. Boundary indices (`i < n` or `i >= N-n`)
/// are exactly 0.
pub fn versine(series: &ResampledSeries, chord_m: f64, mode: VersineMode) -> Result<ResampledSeries> {
    if !CHORD_PRESETS_M.iter().any(|&c| (c - chord_m).abs() < 1e-9) {
        return Err(TrackGeomError::UnsupportedChord(chord_m));
    }

    let tau = series.tau();
    let n = half_chord_count(chord_m, tau);
    let values = series.values();
    let len = values.len();

    let mut out = vec![0.0; len];
    if n < len {
        for i in n..len.saturating_sub(n) {
            let left = values[i - n];
            let right = values[i + n];
            out[i] = match mode {
                VersineMode::Y1 => (left + right) / 2.0 - values[i],
                VersineMode::Y2 => 2.0 * values[i] - left - right,
            };
        }
    }

    Ok(series.with_values(out))
}

fn chord_index_count(arm_m: f64, tau: f64) -> Result<usize> {
    if arm_m <= 0.0 {
        return Err(TrackGeomError::InvalidChord { p: arm_m, q: arm_m });
    }
    Ok(round_half_even(arm_m / tau).max(0) as usize)
}

/// Eccentric versine with asymmetric forward/backward arms `p`, `q` meters
/// (spec §4.4). `y_e[i] = x[i] - (p*x[i-q_n] + q*x[i+p_n]) / (p+q)` for
/// `q_n <= i < N-p_n`, 0 elsewhere.
pub fn eccentric_versine(series: &ResampledSeries, p: f64, q: f64) -> Result<ResampledSeries> {
    if p <= 0.0 || q <= 0.0 {
        return Err(TrackGeomError::InvalidChord { p, q });
    }
    let tau = series.tau();
    let p_n = chord_index_count(p, tau)?;
    let q_n = chord_index_count(q, tau)?;

    let values = series.values();
    let len = values.len();
    let mut out = vec![0.0; len];

    if q_n < len {
        let hi = len.saturating_sub(p_n);
        for i in q_n..hi {
            let back = values[i - q_n];
            let fwd = values[i + p_n];
            out[i] = values[i] - (p * back + q * fwd) / (p + q);
        }
    }

    Ok(series.with_values(out))
}

/// Sinusoidal transfer coefficients `(A, B)` of an eccentric `(p, q)` chord
/// measurement at wavelength `λ` (spec §4.4). Amplitude/phase are derived.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Characteristic {
    pub wavelength_m: f64,
    pub a: f64,
    pub b: f64,
    pub amplitude: f64,
    pub phase: f64,
}

/// Compute the `(A, B)` transfer pair, and derived amplitude/phase, for
/// chord `(p, q)` at wavelength `wavelength_m`.
pub fn characteristic(p: f64, q: f64, wavelength_m: f64) -> Result<Characteristic> {
    if p <= 0.0 || q <= 0.0 {
        return Err(TrackGeomError::InvalidChord { p, q });
    }
    if wavelength_m <= 0.0 {
        return Err(TrackGeomError::InvalidWavelength { min_m: 0.0, max_m: wavelength_m });
    }

    let omega = 2.0 * PI / wavelength_m;
    let a = 1.0 - (p * (omega * q).cos() + q * (omega * p).cos()) / (p + q);
    let b = (-p * (omega * q).sin() + q * (omega * p).sin()) / (p + q);
    let amplitude = (a * a + b * b).sqrt();
    let phase = b.atan2(a);

    Ok(Characteristic { wavelength_m, a, b, amplitude, phase })
}

/// Compute `characteristic` for a batch of wavelengths, as spec's
/// `characteristic(p, q, λs)` operation.
pub fn characteristics(p: f64, q: f64, wavelengths_m: &[f64]) -> Result<Vec<Characteristic>> {
    wavelengths_m.iter().map(|&wl| characteristic(p, q, wl)).collect()
}

/// Minimum `A^2+B^2` below which a characteristic is considered singular for
/// conversion purposes (spec §4.4, §7).
const SINGULAR_EPS: f64 = 1e-9;

/// Quarter-wavelength quadrature shift: for a pure sinusoid at `wavelength_m`,
/// `(y[i+h] - y[i-h]) / 2` recovers the 90-degree-shifted (cosine) component
/// with matching amplitude, which is exactly the operator the `(A,B)`
/// characteristic's real/imaginary decomposition assumes for the derivative
/// term `y1'` in the conversion formula (spec §4.4). Boundary indices are 0.
fn quadrature(values: &[f64], wavelength_m: f64, tau: f64) -> Vec<f64> {
    let h = round_half_even((wavelength_m / 4.0) / tau).max(0) as usize;
    let len = values.len();
    let mut out = vec![0.0; len];
    if h < len {
        for i in h..len - h {
            out[i] = (values[i + h] - values[i - h]) / 2.0;
        }
    }
    out
}

/// Convert a versine series measured under chord `(p1, q1)` to the
/// equivalent series under chord `(p2, q2)` at wavelength `λ` (spec §4.4).
pub fn convert_versine(
    series: &ResampledSeries,
    p1: f64,
    q1: f64,
    p2: f64,
    q2: f64,
    wavelength_m: f64,
) -> Result<ResampledSeries> {
    let c1 = characteristic(p1, q1, wavelength_m)?;
    let c2 = characteristic(p2, q2, wavelength_m)?;

    let magnitude_sq = c1.a * c1.a + c1.b * c1.b;
    if magnitude_sq < SINGULAR_EPS {
        return Err(TrackGeomError::SingularCharacteristic { wavelength_m, magnitude_sq });
    }

    let alpha = (c1.a * c2.a + c1.b * c2.b) / magnitude_sq;
    let beta = (c1.a * c2.b - c2.a * c1.b) / magnitude_sq;

    let values = series.values();
    let derivative = quadrature(&values, wavelength_m, series.tau());

    let out: Vec<f64> = values
        .iter()
        .zip(derivative.iter())
        .map(|(&y, &dy)| alpha * y + beta * dy)
        .collect();

    Ok(series.with_values(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{resample, Sample, Series};
    use std::f64::consts::PI;

    fn arc_lateral_deviation(n: usize, tau: f64, radius_m: f64) -> ResampledSeries {
        // Lateral deviation of a circular arc of radius R sampled along its chord:
        // y(x) = R - sqrt(R^2 - x^2), in the same units as R (meters), converted to mm.
        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                let d = i as f64 * tau;
                let x = d - (n as f64 * tau) / 2.0;
                let y = radius_m - (radius_m * radius_m - x * x).max(0.0).sqrt();
                Sample::new(d, y * 1000.0)
            })
            .collect();
        let series = Series::new(samples).unwrap();
        resample(&series, tau).unwrap()
    }

    #[test]
    fn versine_boundaries_are_zero() {
        let samples: Vec<Sample> = (0..100).map(|i| Sample::new(i as f64 * 0.25, (i as f64).sin())).collect();
        let series = Series::new(samples).unwrap();
        let resampled = resample(&series, 0.25).unwrap();
        let v = versine(&resampled, 10.0, VersineMode::Y1).unwrap();
        let n = half_chord_count(10.0, 0.25);
        for i in 0..n {
            assert_eq!(v.value_at(i), 0.0);
        }
        for i in (v.len() - n)..v.len() {
            assert_eq!(v.value_at(i), 0.0);
        }
    }

    #[test]
    fn versine_rejects_unsupported_chord() {
        let samples: Vec<Sample> = (0..20).map(|i| Sample::new(i as f64 * 0.25, 0.0)).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        assert_eq!(versine(&series, 7.0, VersineMode::Y1), Err(TrackGeomError::UnsupportedChord(7.0)));
    }

    #[test]
    fn versine_of_known_circular_arc_matches_chord_formula() {
        // L^2/(8R) classic mid-chord versine approximation.
        let radius_m = 500.0;
        let tau = 0.25;
        let n = (100.0 / tau) as usize;
        let series = arc_lateral_deviation(n, tau, radius_m);
        let v = versine(&series, 10.0, VersineMode::Y1).unwrap();

        let mid = series.len() / 2;
        let expected_mm = (10.0 * 10.0) / (8.0 * radius_m) * 1000.0;
        assert!((v.value_at(mid) - expected_mm).abs() < 0.5, "got {} expected {}", v.value_at(mid), expected_mm);
    }

    #[test]
    fn eccentric_versine_rejects_non_positive_arms() {
        let samples: Vec<Sample> = (0..20).map(|i| Sample::new(i as f64 * 0.25, 0.0)).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        assert!(matches!(eccentric_versine(&series, 0.0, 5.0), Err(TrackGeomError::InvalidChord { .. })));
        assert!(matches!(eccentric_versine(&series, 5.0, -1.0), Err(TrackGeomError::InvalidChord { .. })));
    }

    #[test]
    fn eccentric_versine_symmetric_arms_match_symmetric_versine() {
        // With p == q, eccentric_versine(i) = x[i] - (left+right)/2 = -Y1[i]
        // (equivalently Y2[i]/2), not Y2[i] itself.
        let samples: Vec<Sample> = (0..200).map(|i| Sample::new(i as f64 * 0.25, (i as f64 * 0.1).sin())).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        let ecc = eccentric_versine(&series, 5.0, 5.0).unwrap();
        let sym = versine(&series, 10.0, VersineMode::Y1).unwrap();
        for (a, b) in ecc.values().iter().zip(sym.values()) {
            assert!((a + b).abs() < 1e-9, "got {} expected {}", a, -b);
        }
    }

    #[test]
    fn characteristic_reduces_to_symmetric_case_when_p_equals_q() {
        let c = characteristic(5.0, 5.0, 10.0).unwrap();
        // At p=q, the symmetric-versine transfer has B=0 (no phase shift) by symmetry.
        assert!(c.b.abs() < 1e-9, "b={}", c.b);
    }

    #[test]
    fn conversion_round_trip_recovers_input() {
        let tau = 0.25;
        let n = 800;
        let wavelength = 20.0;
        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                let d = i as f64 * tau;
                Sample::new(d, 3.0 * (2.0 * PI * d / wavelength).sin() + 0.5 * (2.0 * PI * d / 8.0).sin())
            })
            .collect();
        let series = resample(&Series::new(samples).unwrap(), tau).unwrap();

        let step1 = convert_versine(&series, 10.0, 5.0, 5.0, 10.0, wavelength).unwrap();
        let step2 = convert_versine(&step1, 5.0, 10.0, 10.0, 5.0, wavelength).unwrap();

        let max_x = series.values().iter().cloned().fold(0.0_f64, |m, v| m.max(v.abs()));
        let tol = 1e-4 * max_x;
        // Skip boundary region affected by quadrature-shift edge zeroing.
        let margin = 40;
        for i in margin..(n - margin) {
            assert!(
                (step2.value_at(i) - series.value_at(i)).abs() <= tol,
                "index {i}: {} vs {}",
                step2.value_at(i),
                series.value_at(i)
            );
        }
    }

    #[test]
    fn conversion_rejects_singular_characteristic() {
        let samples: Vec<Sample> = (0..40).map(|i| Sample::new(i as f64 * 0.25, 0.0)).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        // For p=q=5, B=0 identically and A=1-cos(omega*p), which vanishes
        // exactly when wavelength == p (omega*p == 2*pi).
        let result = convert_versine(&series, 5.0, 5.0, 10.0, 10.0, 5.0);
        assert!(matches!(result, Err(TrackGeomError::SingularCharacteristic { .. })));
    }
}
