//! Generate reference fixtures exercising the pipeline end to end, for
//! cross-checking against an independent implementation.
//!
//! Run with: `cargo test generate_fixtures -- --ignored`
//!
//! Outputs JSON fixtures to `tests/fixtures/`.

use serde::Serialize;
use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;
use trackgeom_core::correction::{apply_caps, quality, raw_movement, MovementLimits, WAVEBANDS};
use trackgeom_core::geometry::{generate_convex_upward, versine, zero_crossings, VersineMode, ZeroCrossingConfig};
use trackgeom_core::{restore, AbortToken, RestoreConfig, Sample, Series};

#[derive(Serialize)]
struct RestoreFixture {
    params: RestoreParams,
    input: Vec<f64>,
    restored: Vec<f64>,
}

#[derive(Serialize)]
struct RestoreParams {
    tau: f64,
    wavelength_min_m: f64,
    wavelength_max_m: f64,
}

#[derive(Serialize)]
struct VersineFixture {
    chord_m: f64,
    input: Vec<f64>,
    versine: Vec<f64>,
}

#[derive(Serialize)]
struct PlanLineFixture {
    restored: Vec<f64>,
    plan: Vec<f64>,
    movement: Vec<f64>,
    clamped_movement: Vec<f64>,
}

#[derive(Serialize)]
struct QualityFixture {
    restored: Vec<f64>,
    movement: Vec<f64>,
    sigma_before: f64,
    sigma_after: f64,
    improvement_rate_pct: f64,
}

fn fixture_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path
}

fn write_fixture(name: &str, fixture: &impl Serialize) {
    let dir = fixture_dir();
    fs::create_dir_all(&dir).expect("failed to create fixtures directory");
    let path = dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(fixture).expect("failed to serialize fixture");
    fs::write(&path, json).expect("failed to write fixture file");
    println!("wrote fixture: {}", path.display());
}

fn sine_series(n: usize, tau: f64, wavelength_m: f64, amplitude: f64) -> Series {
    let samples = (0..n)
        .map(|i| {
            let d = i as f64 * tau;
            Sample::new(d, amplitude * (2.0 * PI * d / wavelength_m).sin())
        })
        .collect();
    Series::new(samples).unwrap()
}

#[test]
#[ignore]
fn generate_fixtures() {
    let tau = 0.25;

    // --- restore_band_limited_sine ---
    {
        let n = (100.0 / tau) as usize + 1;
        let series = sine_series(n, tau, 10.0, 2.0);
        let config = RestoreConfig { tau, wavelength_min_m: 6.0, wavelength_max_m: 40.0 };
        let restored = restore(&series, &config, &AbortToken::never()).unwrap();

        write_fixture(
            "restore_band_limited_sine",
            &RestoreFixture {
                params: RestoreParams {
                    tau: config.tau,
                    wavelength_min_m: config.wavelength_min_m,
                    wavelength_max_m: config.wavelength_max_m,
                },
                input: series.values(),
                restored: restored.values(),
            },
        );
    }

    // --- restore_step_function ---
    {
        let mut values = vec![0.0; 200];
        values.extend(vec![10.0; 200]);
        let samples = values.iter().enumerate().map(|(i, &v)| Sample::new(i as f64 * tau, v)).collect();
        let series = Series::new(samples).unwrap();
        let config = RestoreConfig::default();
        let restored = restore(&series, &config, &AbortToken::never()).unwrap();

        write_fixture(
            "restore_step_function",
            &RestoreFixture {
                params: RestoreParams {
                    tau: config.tau,
                    wavelength_min_m: config.wavelength_min_m,
                    wavelength_max_m: config.wavelength_max_m,
                },
                input: series.values(),
                restored: restored.values(),
            },
        );
    }

    // --- versine_circular_arc_10m_chord ---
    {
        let radius_m = 500.0;
        let n = (100.0 / tau) as usize;
        let samples: Vec<Sample> = (0..n)
            .map(|i| {
                let d = i as f64 * tau;
                let x = d - (n as f64 * tau) / 2.0;
                let y = radius_m - (radius_m * radius_m - x * x).max(0.0).sqrt();
                Sample::new(d, y * 1000.0)
            })
            .collect();
        let series = Series::new(samples).unwrap();
        let resampled = trackgeom_core::resample(&series, tau).unwrap();
        let v = versine(&resampled, 10.0, VersineMode::Y1).unwrap();

        write_fixture(
            "versine_circular_arc_10m_chord",
            &VersineFixture { chord_m: 10.0, input: resampled.values(), versine: v.values() },
        );
    }

    // --- plan_line_convex_upward_and_movement ---
    {
        let n = 400;
        let series = sine_series(n, tau, 20.0, 3.0);
        let config = RestoreConfig::default();
        let restored = restore(&series, &config, &AbortToken::never()).unwrap();

        let crossings = zero_crossings(&restored, &ZeroCrossingConfig::default());
        let plan = generate_convex_upward(&restored, &crossings, None, Some(2.0)).unwrap();
        let movement = raw_movement(&restored, &plan).unwrap();

        let limits = MovementLimits::global(15.0, 15.0);
        let (clamped, _) = apply_caps(&movement, &limits).unwrap();

        write_fixture(
            "plan_line_convex_upward_and_movement",
            &PlanLineFixture {
                restored: restored.values(),
                plan: plan.values(),
                movement: movement.values(),
                clamped_movement: clamped.values(),
            },
        );
    }

    // --- quality_report_20m_sinusoid ---
    {
        let n = 512;
        let series = sine_series(n, tau, 20.0, 2.0);
        let config = RestoreConfig::default();
        let restored = restore(&series, &config, &AbortToken::never()).unwrap();
        let zero_movement = restored.with_values(vec![0.0; restored.len()]);
        let (report, _) = quality(&restored, &zero_movement, 200.0, &WAVEBANDS).unwrap();

        write_fixture(
            "quality_report_20m_sinusoid",
            &QualityFixture {
                restored: restored.values(),
                movement: zero_movement.values(),
                sigma_before: report.sigma_before,
                sigma_after: report.sigma_after,
                improvement_rate_pct: report.improvement_rate_pct,
            },
        );
    }
}
