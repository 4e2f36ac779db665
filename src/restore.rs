//! Restoration pipeline (component C): ties signal primitives and the
//! spectral engine together to recover the maintenance-realizable,
//! band-limited component of a raw measurement series.

use crate::abort::AbortToken;
use crate::error::Result;
use crate::sample::{resample, ResampledSeries, Series};
use crate::spectral::{FftEngine, FilterSpec};

/// Configuration for `restore`. Defaults match spec §4.3 for conventional
/// lines: τ=0.25 m, band 6–40 m.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RestoreConfig {
    pub tau: f64,
    pub wavelength_min_m: f64,
    pub wavelength_max_m: f64,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        RestoreConfig { tau: 0.25, wavelength_min_m: 6.0, wavelength_max_m: 40.0 }
    }
}

/// Resample → pack complex → FFT → zero outside passband → IFFT → take the
/// real parts of the first N samples as the restored waveform, aligned to
/// the resampled distances (spec §4.3).
#[tracing::instrument(skip(series, abort), fields(n = series.len()))]
pub fn restore(series: &Series, config: &RestoreConfig, abort: &AbortToken) -> Result<ResampledSeries> {
    let filter = FilterSpec::Bandpass {
        wavelength_min_m: config.wavelength_min_m,
        wavelength_max_m: config.wavelength_max_m,
    };
    filter.validate()?;

    abort.check()?;
    let resampled = resample(series, config.tau)?;

    abort.check()?;
    let mut engine = FftEngine::new();
    let mut spectrum = engine.forward(&resampled.values(), config.tau)?;

    abort.check()?;
    filter.apply(&mut spectrum)?;

    abort.check()?;
    let restored_values = engine.inverse(&spectrum)?;

    Ok(resampled.with_values(restored_values))
}
