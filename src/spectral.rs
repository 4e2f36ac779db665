//! Spectral engine (component B): real FFT/IFFt over power-of-two-padded
//! buffers, and frequency-domain gating for bandpass / lowpass / highpass /
//! bandstop filtering.
//!
//! Mirrors `catune-solver`'s `FftConvolver`: a `RealFftPlanner<f64>` pair of
//! cached forward/inverse plans plus grow-only scratch buffers, since
//! real-valued signals only need the non-negative half of the spectrum.
//! Using the real-to-complex transform automatically gives mirror-symmetric
//! gating for free (spec §4.2) — there is no separate negative-frequency
//! half to keep in sync, the complex conjugate half is never materialized.

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use std::sync::Arc;

use crate::error::{Result, TrackGeomError};

/// A complex-valued spectrum of a zero-padded real signal, plus the bookkeeping
/// needed to map bin index to frequency and to invert back to time domain.
#[derive(Clone)]
pub struct SpectralBuffer {
    /// Padded length M = next_power_of_two(N).
    padded_len: usize,
    /// Original, unpadded sample count N.
    source_len: usize,
    /// Sampling interval in meters.
    tau: f64,
    /// M/2+1 complex bins.
    spectrum: Vec<Complex<f64>>,
}

impl SpectralBuffer {
    pub fn padded_len(&self) -> usize {
        self.padded_len
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Frequency of bin `i` in cycles/meter (spec §4.2): `f_i = i / (M*tau)`.
    pub fn bin_frequency(&self, i: usize) -> f64 {
        i as f64 / (self.padded_len as f64 * self.tau)
    }

    pub fn bins(&self) -> &[Complex<f64>] {
        &self.spectrum
    }

    pub fn bins_mut(&mut self) -> &mut [Complex<f64>] {
        &mut self.spectrum
    }
}

/// Owns cached FFT plans and scratch buffers for a single padded length.
/// Not thread-shared; a fresh `FftEngine` is cheap relative to re-planning
/// inside a hot loop, and the restoration pipeline owns one per call
/// (spec §5 "FFT ownership": spectral buffers are owned by the restoration
/// call).
pub struct FftEngine {
    planner: RealFftPlanner<f64>,
    planned_len: usize,
    plan_fwd: Option<Arc<dyn RealToComplex<f64>>>,
    plan_inv: Option<Arc<dyn ComplexToReal<f64>>>,
    scratch_fwd: Vec<Complex<f64>>,
    scratch_inv: Vec<Complex<f64>>,
}

impl Default for FftEngine {
    fn default() -> Self {
        FftEngine::new()
    }
}

impl FftEngine {
    pub fn new() -> Self {
        FftEngine {
            planner: RealFftPlanner::new(),
            planned_len: 0,
            plan_fwd: None,
            plan_inv: None,
            scratch_fwd: Vec::new(),
            scratch_inv: Vec::new(),
        }
    }

    fn ensure_plans(&mut self, padded_len: usize) {
        if self.planned_len == padded_len {
            return;
        }
        let fwd = self.planner.plan_fft_forward(padded_len);
        let inv = self.planner.plan_fft_inverse(padded_len);
        let fwd_scratch = fwd.get_scratch_len();
        let inv_scratch = inv.get_scratch_len();
        if self.scratch_fwd.len() < fwd_scratch {
            self.scratch_fwd.resize(fwd_scratch, Complex::new(0.0, 0.0));
        }
        if self.scratch_inv.len() < inv_scratch {
            self.scratch_inv.resize(inv_scratch, Complex::new(0.0, 0.0));
        }
        self.plan_fwd = Some(fwd);
        self.plan_inv = Some(inv);
        self.planned_len = padded_len;
    }

    /// Forward real FFT of `values`, zero-padded to the next power of two.
    /// `values` must contain at least 2 samples.
    pub fn forward(&mut self, values: &[f64], tau: f64) -> Result<SpectralBuffer> {
        let n = values.len();
        if n == 0 {
            return Err(TrackGeomError::EmptyInput);
        }
        if n < 2 {
            return Err(TrackGeomError::InsufficientData(n));
        }

        let padded_len = n.next_power_of_two().max(2);
        self.ensure_plans(padded_len);

        let mut input = vec![0.0_f64; padded_len];
        input[..n].copy_from_slice(values);

        let spectrum_len = padded_len / 2 + 1;
        let mut spectrum = vec![Complex::new(0.0, 0.0); spectrum_len];

        let fwd = self.plan_fwd.as_ref().expect("plans initialized above").clone();
        fwd.process_with_scratch(&mut input, &mut spectrum, &mut self.scratch_fwd)
            .map_err(|e| TrackGeomError::Overflow { context: format!("forward FFT: {e}") })?;

        Ok(SpectralBuffer { padded_len, source_len: n, tau, spectrum })
    }

    /// Inverse real FFT, returning the first `source_len` real samples of
    /// the padded `M`-length time-domain result, normalized by `1/M`
    /// (realfft does not normalize internally).
    pub fn inverse(&mut self, buffer: &SpectralBuffer) -> Result<Vec<f64>> {
        let padded_len = buffer.padded_len;
        self.ensure_plans(padded_len);

        let mut spectrum = buffer.spectrum.clone();
        let mut output = vec![0.0_f64; padded_len];

        let inv = self.plan_inv.as_ref().expect("plans initialized above").clone();
        inv.process_with_scratch(&mut spectrum, &mut output, &mut self.scratch_inv)
            .map_err(|e| TrackGeomError::Overflow { context: format!("inverse FFT: {e}") })?;

        let scale = 1.0 / padded_len as f64;
        output.truncate(buffer.source_len);
        for v in output.iter_mut() {
            *v *= scale;
        }
        Ok(output)
    }
}

/// A frequency-domain gate over a passband, single cutoff (LP/HP), or
/// bandstop region (spec §4.2), expressed in wavelengths (meters). One
/// tagged variant with a gate predicate — no dynamic dispatch needed
/// (Design Notes: "Polymorphic filter operations are one tagged variant").
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FilterSpec {
    Bandpass { wavelength_min_m: f64, wavelength_max_m: f64 },
    Lowpass { cutoff_m: f64 },
    Highpass { cutoff_m: f64 },
    Bandstop { wavelength_min_m: f64, wavelength_max_m: f64 },
}

impl FilterSpec {
    pub fn validate(&self) -> Result<()> {
        match *self {
            FilterSpec::Bandpass { wavelength_min_m, wavelength_max_m }
            | FilterSpec::Bandstop { wavelength_min_m, wavelength_max_m } => {
                if !(wavelength_min_m > 0.0 && wavelength_max_m > wavelength_min_m) {
                    return Err(TrackGeomError::InvalidWavelength {
                        min_m: wavelength_min_m,
                        max_m: wavelength_max_m,
                    });
                }
            }
            FilterSpec::Lowpass { cutoff_m } | FilterSpec::Highpass { cutoff_m } => {
                if cutoff_m <= 0.0 {
                    return Err(TrackGeomError::InvalidWavelength { min_m: 0.0, max_m: cutoff_m });
                }
            }
        }
        Ok(())
    }

    /// `true` if a bin at `freq` cycles/meter should be kept (not zeroed).
    fn keep(&self, freq: f64) -> bool {
        match *self {
            FilterSpec::Bandpass { wavelength_min_m, wavelength_max_m } => {
                let lo = 1.0 / wavelength_max_m;
                let hi = 1.0 / wavelength_min_m;
                freq >= lo && freq <= hi
            }
            FilterSpec::Lowpass { cutoff_m } => freq <= 1.0 / cutoff_m,
            FilterSpec::Highpass { cutoff_m } => freq >= 1.0 / cutoff_m,
            FilterSpec::Bandstop { wavelength_min_m, wavelength_max_m } => {
                let lo = 1.0 / wavelength_max_m;
                let hi = 1.0 / wavelength_min_m;
                !(freq >= lo && freq <= hi)
            }
        }
    }

    /// Zero every bin of `buffer` outside the pass region, in place. Both DC
    /// (i=0) and Nyquist (i=M/2) are gated like any other bin (spec §4.2).
    pub fn apply(&self, buffer: &mut SpectralBuffer) -> Result<()> {
        self.validate()?;
        let n = buffer.bins().len();
        for i in 0..n {
            let freq = buffer.bin_frequency(i);
            if !self.keep(freq) {
                buffer.bins_mut()[i] = Complex::new(0.0, 0.0);
            }
        }
        Ok(())
    }
}
