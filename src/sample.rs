//! Signal primitives (component A): equal-interval resampling, linear
//! interpolation, and descriptive statistics over aligned sequences.

use crate::error::{check_finite, Result, TrackGeomError};
use crate::util::ABS_TOL;

/// A single `(distance, value)` measurement. Distance in meters, value in
/// millimeters (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sample {
    pub distance: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(distance: f64, value: f64) -> Self {
        Sample { distance, value }
    }
}

/// An ordered sequence of samples with strictly increasing distances.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Build a `Series`, validating the strictly-increasing-distance
    /// invariant and rejecting non-finite values.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        check_finite(&samples.iter().map(|s| s.distance).collect::<Vec<_>>())?;
        check_finite(&samples.iter().map(|s| s.value).collect::<Vec<_>>())?;
        for w in samples.windows(2) {
            if w[1].distance <= w[0].distance {
                return Err(TrackGeomError::NonMonotonic {
                    index: 1,
                    prev: w[0].distance,
                    next: w[1].distance,
                });
            }
        }
        Ok(Series { samples })
    }

    /// Build from parallel distance/value slices without re-validating;
    /// used internally once an invariant is already known to hold.
    pub(crate) fn from_validated(samples: Vec<Sample>) -> Self {
        Series { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn distances(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.distance).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn value_at_index(&self, i: usize) -> f64 {
        self.samples[i].value
    }

    pub fn distance_at_index(&self, i: usize) -> f64 {
        self.samples[i].distance
    }
}

/// A `Series` resampled onto an arithmetic progression with step `tau`,
/// starting at `d0`, length `n`. `n` need not be a power of two (spec §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResampledSeries {
    series: Series,
    tau: f64,
    d0: f64,
}

impl ResampledSeries {
    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn d0(&self) -> f64 {
        self.d0
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn values(&self) -> Vec<f64> {
        self.series.values()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.series.distances()
    }

    pub fn value_at(&self, i: usize) -> f64 {
        self.series.value_at_index(i)
    }

    /// Build a `ResampledSeries` that shares this one's distances/tau but
    /// carries different values (e.g. a restored or plan waveform).
    pub fn with_values(&self, values: Vec<f64>) -> ResampledSeries {
        debug_assert_eq!(values.len(), self.len());
        let samples = self
            .series
            .samples()
            .iter()
            .zip(values)
            .map(|(s, v)| Sample::new(s.distance, v))
            .collect();
        ResampledSeries {
            series: Series::from_validated(samples),
            tau: self.tau,
            d0: self.d0,
        }
    }
}

/// Resample `series` onto a step-`tau` grid starting at its minimum
/// distance, via linear interpolation; values outside the input range clamp
/// to the nearest endpoint. Ties within `1e-9` of an input sample take that
/// sample's value directly (spec §4.7 resample tie-break).
pub fn resample(series: &Series, tau: f64) -> Result<ResampledSeries> {
    if series.is_empty() {
        return Err(TrackGeomError::EmptyInput);
    }
    if series.len() < 2 {
        return Err(TrackGeomError::InsufficientData(series.len()));
    }

    let d_min = series.distance_at_index(0);
    let d_max = series.distance_at_index(series.len() - 1);
    let n_steps = ((d_max - d_min) / tau).floor() as i64;

    let mut samples = Vec::with_capacity((n_steps + 1) as usize);
    let mut cursor = 0usize;

    for k in 0..=n_steps {
        let d = d_min + (k as f64) * tau;
        let value = interpolate_at(series, d, &mut cursor);
        samples.push(Sample::new(d, value));
    }

    Ok(ResampledSeries {
        series: Series::from_validated(samples),
        tau,
        d0: d_min,
    })
}

/// Linear interpolation of `series` at distance `d`. `cursor` is an in/out
/// hint to the enclosing-sample search, exploited by `resample`'s
/// monotonically increasing scan to stay O(N) overall instead of O(N log N).
fn interpolate_at(series: &Series, d: f64, cursor: &mut usize) -> f64 {
    let samples = series.samples();
    let n = samples.len();

    if d <= samples[0].distance {
        return samples[0].value;
    }
    if d >= samples[n - 1].distance {
        return samples[n - 1].value;
    }

    while *cursor + 1 < n && samples[*cursor + 1].distance < d {
        *cursor += 1;
    }

    let a = samples[*cursor];
    let b = samples[(*cursor + 1).min(n - 1)];

    if (d - a.distance).abs() <= ABS_TOL {
        return a.value;
    }
    if (d - b.distance).abs() <= ABS_TOL {
        return b.value;
    }

    let span = b.distance - a.distance;
    if span.abs() <= ABS_TOL {
        return a.value;
    }
    let t = (d - a.distance) / span;
    a.value + t * (b.value - a.value)
}

/// Descriptive statistics over a value series (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
    pub rms: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Compute min/max/mean/variance/σ/percentiles/RMS/skewness/excess kurtosis
/// for a value slice. Population statistics throughout (divide by n, not
/// n-1), per spec §4.1.
pub fn statistics(values: &[f64]) -> Statistics {
    let n = values.len();
    if n == 0 {
        return Statistics {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            median: 0.0,
            p25: 0.0,
            p75: 0.0,
            p95: 0.0,
            rms: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        };
    }

    let n_f = n as f64;
    let mean = values.iter().sum::<f64>() / n_f;
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n_f;
    let std_dev = variance.sqrt();
    let rms = (values.iter().map(|&v| v * v).sum::<f64>() / n_f).sqrt();

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = percentile(&sorted, 0.50);
    let p25 = percentile(&sorted, 0.25);
    let p75 = percentile(&sorted, 0.75);
    let p95 = percentile(&sorted, 0.95);

    let (skewness, kurtosis) = if std_dev < 1e-12 {
        (0.0, 0.0)
    } else {
        let m3 = values.iter().map(|&v| ((v - mean) / std_dev).powi(3)).sum::<f64>() / n_f;
        let m4 = values.iter().map(|&v| ((v - mean) / std_dev).powi(4)).sum::<f64>() / n_f;
        (m3, m4 - 3.0)
    };

    Statistics {
        min,
        max,
        mean,
        variance,
        std_dev,
        median,
        p25,
        p75,
        p95,
        rms,
        skewness,
        kurtosis,
    }
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let rank = (p * n_as_rank(n)).ceil() as usize;
    let idx = rank.saturating_sub(1).min(n - 1);
    sorted[idx]
}

fn n_as_rank(n: usize) -> f64 {
    n as f64
}

/// Population standard deviation helper, exposed for callers (e.g. quality
/// reports) that only need σ without the full `Statistics` bundle.
pub fn std_dev(values: &[f64]) -> f64 {
    statistics(values).std_dev
}

/// Pearson correlation coefficient over the common prefix of `a` and `b`
/// (spec §4.1). Returns 0 when the denominator is 0.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let a = &a[..n];
    let b = &b[..n];
    let n_f = n as f64;

    let mean_x = a.iter().sum::<f64>() / n_f;
    let mean_y = b.iter().sum::<f64>() / n_f;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = a[i] - mean_x;
        let dy = b[i] - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom < 1e-12 {
        0.0
    } else {
        sxy / denom
    }
}
