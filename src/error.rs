//! Error taxonomy and diagnostics sidecar (spec §7).
//!
//! Every fallible core operation returns `Result<T, TrackGeomError>`. Local
//! recovery (boundary zeros, skipped empty sections, MTT convergence
//! fallback) never produces an `Err`; it is surfaced instead as a `Warning`
//! on the `Diagnostics` list returned alongside the value.

use thiserror::Error;

/// Flat error enum mirroring the InputValidation / Numerics / Constraints /
/// Control groups from spec §7. Rust error handling favors a single flat
/// enum matched by variant over a nested taxonomy of types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackGeomError {
    #[error("input series is empty")]
    EmptyInput,

    #[error("input series has fewer than two samples (got {0})")]
    InsufficientData(usize),

    #[error("input contains a non-finite value at index {index}: {value}")]
    NonFinite { index: usize, value: f64 },

    #[error("distances are not strictly increasing at index {index}: {prev} >= {next}")]
    NonMonotonic { index: usize, prev: f64, next: f64 },

    #[error("unsupported chord length {0} m (expected one of 5, 10, 20, 40)")]
    UnsupportedChord(f64),

    #[error("invalid chord arms p={p}, q={q} (both must be > 0)")]
    InvalidChord { p: f64, q: f64 },

    #[error("invalid wavelength bounds: min={min_m} max={max_m}")]
    InvalidWavelength { min_m: f64, max_m: f64 },

    #[error("characteristic (A,B) is singular at wavelength {wavelength_m} m (A^2+B^2={magnitude_sq:e})")]
    SingularCharacteristic { wavelength_m: f64, magnitude_sq: f64 },

    #[error("numeric overflow while computing {context}")]
    Overflow { context: String },

    #[error("incompatible constraints: {reason}")]
    IncompatibleConstraints { reason: String },

    #[error("no plan line satisfies the configured constraints: {reason}")]
    InfeasibleConstraints { reason: String },

    #[error("distance {distance} is out of range [{min}, {max}]")]
    OutOfRange { distance: f64, min: f64, max: f64 },

    #[error("invalid edit parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, TrackGeomError>;

/// A structured, non-fatal warning attached to an operation's diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Warning {
    pub code: &'static str,
    pub message: String,
}

impl Warning {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Warning { code, message: message.into() }
    }
}

/// Sidecar list of warnings returned alongside a successful result.
/// Success vs. failure stays binary (spec §7); warnings never fail a call.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, code: &'static str, message: impl Into<String>) {
        self.warnings.push(Warning::new(code, message));
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Validate that every sample in a slice is finite, mapping the first
/// offender to `NonFinite`.
pub(crate) fn check_finite(values: &[f64]) -> Result<()> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(TrackGeomError::NonFinite { index, value });
        }
    }
    Ok(())
}
