//! Zero-crossing detection (spec §4.4).

use crate::sample::ResampledSeries;

/// Direction of a detected zero crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CrossingType {
    Ascending,
    Descending,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZeroCrossing {
    pub distance: f64,
    pub index_before: usize,
    pub crossing_type: CrossingType,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZeroCrossingConfig {
    pub threshold: f64,
    pub min_interval_m: f64,
}

impl Default for ZeroCrossingConfig {
    fn default() -> Self {
        ZeroCrossingConfig { threshold: 0.01, min_interval_m: 1.0 }
    }
}

/// Scan consecutive samples for sign changes (or near-zero straddles),
/// interpolate the crossing distance, classify direction, and suppress
/// crossings closer together than `min_interval_m` (spec §4.4).
pub fn zero_crossings(series: &ResampledSeries, config: &ZeroCrossingConfig) -> Vec<ZeroCrossing> {
    let values = series.values();
    let distances = series.distances();
    let tau = series.tau();
    let threshold = config.threshold;

    let mut raw = Vec::new();
    for i in 1..values.len() {
        let prev = values[i - 1];
        let curr = values[i];

        let sign_change = prev * curr < 0.0;
        let straddle = (prev.abs() <= threshold) != (curr.abs() <= threshold);
        if !sign_change && !straddle {
            continue;
        }

        let denom = prev.abs() + curr.abs();
        let frac = if denom > 0.0 { prev.abs() / denom } else { 0.0 };
        let distance = distances[i - 1] + tau * frac;

        let crossing_type = if prev < 0.0 && curr >= 0.0 {
            CrossingType::Ascending
        } else if prev >= 0.0 && curr < 0.0 {
            CrossingType::Descending
        } else {
            CrossingType::Neutral
        };

        raw.push(ZeroCrossing { distance, index_before: i - 1, crossing_type });
    }

    suppress_close_crossings(raw, config.min_interval_m)
}

/// Drop later crossings that fall within `min_interval_m` of the one kept
/// before them (spec: "the later one dropped").
fn suppress_close_crossings(crossings: Vec<ZeroCrossing>, min_interval_m: f64) -> Vec<ZeroCrossing> {
    let mut kept: Vec<ZeroCrossing> = Vec::with_capacity(crossings.len());
    for c in crossings {
        if let Some(last) = kept.last() {
            if c.distance - last.distance < min_interval_m {
                continue;
            }
        }
        kept.push(c);
    }
    kept
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
    fn crossings_straddle_opposite_signs() {
        let series = sine_series(401, 0.25, 10.0, 2.0);
        let config = ZeroCrossingConfig::default();
        let crossings = zero_crossings(&series, &config);
        assert!(!crossings.is_empty());
        for c in &crossings {
            let a = series.value_at(c.index_before);
            let b = series.value_at(c.index_before + 1);
            let straddles = a * b < 0.0 || a.abs() <= config.threshold || b.abs() <= config.threshold;
            assert!(straddles, "crossing at {} not straddling: {} {}", c.distance, a, b);
        }
    }

    #[test]
    fn crossings_of_pure_sine_land_near_half_wavelength_multiples() {
        let wavelength = 10.0;
        let series = sine_series(401, 0.25, wavelength, 2.0);
        let crossings = zero_crossings(&series, &ZeroCrossingConfig::default());
        for c in &crossings {
            let nearest_multiple = (c.distance / (wavelength / 2.0)).round() * (wavelength / 2.0);
            assert!((c.distance - nearest_multiple).abs() < 0.01, "distance {}", c.distance);
        }
    }

    #[test]
    fn close_crossings_are_suppressed() {
        // Two crossings 0.5 m apart should collapse to one under a 1 m min interval.
        let samples = vec![
            Sample::new(0.0, -1.0),
            Sample::new(0.25, 1.0),
            Sample::new(0.5, -1.0),
            Sample::new(0.75, -1.0),
            Sample::new(1.0, -1.0),
        ];
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        let crossings = zero_crossings(&series, &ZeroCrossingConfig { threshold: 0.01, min_interval_m: 1.0 });
        assert_eq!(crossings.len(), 1);
    }

    #[test]
    fn no_crossings_in_constant_positive_series() {
        let samples: Vec<Sample> = (0..20).map(|i| Sample::new(i as f64 * 0.25, 5.0)).collect();
        let series = resample(&Series::new(samples).unwrap(), 0.25).unwrap();
        assert!(zero_crossings(&series, &ZeroCrossingConfig::default()).is_empty());
    }
}
