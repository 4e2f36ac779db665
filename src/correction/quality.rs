//! Quality statistics: σ before/after, grade, and section/waveband
//! breakdowns (spec §4.5).

use crate::error::{Diagnostics, Result};
use crate::sample::{std_dev, ResampledSeries};
use crate::spectral::{FftEngine, FilterSpec};

/// Waveband boundary wavelengths taken as given (spec §9 Open Questions):
/// short 3-10 m, mid 10-30 m, long 30-70 m.
pub const WAVEBANDS: [(&str, f64, f64); 3] = [("short", 3.0, 10.0), ("mid", 10.0, 30.0), ("long", 30.0, 70.0)];

/// Letter grade from improvement rate: A >= 50, B >= 40, C >= 30, D >= 20,
/// else E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

fn grade_for(improvement_rate_pct: f64) -> Grade {
    if improvement_rate_pct >= 50.0 {
        Grade::A
    } else if improvement_rate_pct >= 40.0 {
        Grade::B
    } else if improvement_rate_pct >= 30.0 {
        Grade::C
    } else if improvement_rate_pct >= 20.0 {
        Grade::D
    } else {
        Grade::E
    }
}

/// `(σ_before - σ_after) / σ_before * 100`, rounded to one decimal; 0 when
/// `σ_before` is 0.
fn improvement_rate(sigma_before: f64, sigma_after: f64) -> f64 {
    if sigma_before == 0.0 {
        return 0.0;
    }
    let raw = (sigma_before - sigma_after) / sigma_before * 100.0;
    (raw * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SectionQuality {
    pub start_d: f64,
    pub end_d: f64,
    pub sigma_before: f64,
    pub sigma_after: f64,
    pub improvement_rate_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WavebandQuality {
    pub name: &'static str,
    pub wavelength_min_m: f64,
    pub wavelength_max_m: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QualityReport {
    pub sigma_before: f64,
    pub sigma_after: f64,
    pub improvement_rate_pct: f64,
    pub grade: Grade,
    pub by_section: Vec<SectionQuality>,
    pub by_waveband: Vec<WavebandQuality>,
}

/// σ before is σ of the restored waveform; σ after is σ of `restored -
/// movement`, i.e. the expected post-tamping geometry (spec §4.5). Also
/// computes a per-`section_length_m` breakdown and a per-waveband σ
/// breakdown (reusing the spectral engine's forward transform once and
/// re-gating it per band, per spec §9 "FFT ownership").
pub fn quality(
    restored: &ResampledSeries,
    movement: &ResampledSeries,
    section_length_m: f64,
    wavebands: &[(&'static str, f64, f64)],
) -> Result<(QualityReport, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();

    let restored_values = restored.values();
    let residual: Vec<f64> = restored_values.iter().zip(movement.values()).map(|(r, m)| r - m).collect();

    let sigma_before = std_dev(&restored_values);
    let sigma_after = std_dev(&residual);
    let improvement_rate_pct = improvement_rate(sigma_before, sigma_after);
    let grade = grade_for(improvement_rate_pct);

    let by_section = section_breakdown(restored, &residual, section_length_m, &mut diagnostics);
    let by_waveband = waveband_breakdown(restored, wavebands)?;

    Ok((
        QualityReport { sigma_before, sigma_after, improvement_rate_pct, grade, by_section, by_waveband },
        diagnostics,
    ))
}

fn section_breakdown(
    restored: &ResampledSeries,
    residual: &[f64],
    section_length_m: f64,
    diagnostics: &mut Diagnostics,
) -> Vec<SectionQuality> {
    let distances = restored.distances();
    let restored_values = restored.values();
    if distances.is_empty() || section_length_m <= 0.0 {
        return Vec::new();
    }

    let d_min = distances[0];
    let d_max = distances[distances.len() - 1];
    let mut sections = Vec::new();

    let mut start_d = d_min;
    while start_d < d_max {
        let end_d = (start_d + section_length_m).min(d_max);
        let indices: Vec<usize> =
            (0..distances.len()).filter(|&i| distances[i] >= start_d && distances[i] < end_d).collect();

        if indices.len() < 2 {
            diagnostics.push("EMPTY_SECTION", format!("section [{start_d}, {end_d}) has fewer than 2 samples, skipped"));
            start_d = end_d;
            continue;
        }

        let section_restored: Vec<f64> = indices.iter().map(|&i| restored_values[i]).collect();
        let section_residual: Vec<f64> = indices.iter().map(|&i| residual[i]).collect();
        let sigma_before = std_dev(&section_restored);
        let sigma_after = std_dev(&section_residual);

        sections.push(SectionQuality {
            start_d,
            end_d,
            sigma_before,
            sigma_after,
            improvement_rate_pct: improvement_rate(sigma_before, sigma_after),
        });
        start_d = end_d;
    }

    sections
}

fn waveband_breakdown(restored: &ResampledSeries, wavebands: &[(&'static str, f64, f64)]) -> Result<Vec<WavebandQuality>> {
    let mut engine = FftEngine::new();
    let forward = engine.forward(&restored.values(), restored.tau())?;

    let mut out = Vec::with_capacity(wavebands.len());
    for &(name, wavelength_min_m, wavelength_max_m) in wavebands {
        let mut buffer = forward.clone();
        let filter = FilterSpec::Bandpass { wavelength_min_m, wavelength_max_m };
        filter.apply(&mut buffer)?;
        let band_values = engine.inverse(&buffer)?;
        out.push(WavebandQuality { name, wavelength_min_m, wavelength_max_m, sigma: std_dev(&band_values) });
    }
    Ok(out)
}
